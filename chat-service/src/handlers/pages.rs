use crate::startup::AppState;
use axum::{extract::State, response::Html};
use service_core::error::AppError;

/// `GET /`: the browser chat page.
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let path = &state.config.chat.index_path;

    let page = tokio::fs::read_to_string(path).await.map_err(|e| {
        tracing::warn!(path = %path, error = %e, "Chat page not available");
        AppError::NotFound(anyhow::anyhow!("Chat page not found"))
    })?;

    Ok(Html(page))
}
