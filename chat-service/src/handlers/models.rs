use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};

/// `GET /api/models`: models per provider with a configured credential.
pub async fn list_models(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.catalog.as_ref().clone())
}
