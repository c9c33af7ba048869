//! `POST /api/chat`: multipart form in, response envelope out.

use crate::error::ChatError;
use crate::models::{ChatTurn, ResponseEnvelope, UploadedFile};
use crate::services::pipeline::{ChatRequest, DEFAULT_PROVIDER};
use crate::startup::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Every outcome, including a body that is not a readable multipart form,
/// is answered with the envelope: 200 on success, 500 otherwise.
pub async fn chat(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let outcome = match multipart {
        Ok(multipart) => match read_chat_form(multipart).await {
            Ok(request) => state.pipeline.run(request).await,
            Err(e) => Err(e),
        },
        Err(rejection) => Err(ChatError::MalformedRequest(rejection.body_text())),
    };

    match outcome {
        Ok(reply) => (
            StatusCode::OK,
            Json(ResponseEnvelope::success(reply.result, reply.files)),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(kind = e.kind(), error = %e, "Chat request failed");
            e.into_response()
        }
    }
}

/// Collect the `provider`, `model`, `messages` and `files` fields.
///
/// Only the first value of a repeated text field is used; unknown fields are
/// ignored. `provider` defaults to gemini only when the field is absent.
async fn read_chat_form(mut multipart: Multipart) -> Result<ChatRequest, ChatError> {
    let mut provider: Option<String> = None;
    let mut model: Option<String> = None;
    let mut messages: Option<String> = None;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ChatError::MalformedRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "files" => {
                let name = field.file_name().unwrap_or_default().to_string();
                let mime_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(|e| {
                    ChatError::MalformedRequest(format!("Failed to read file {}: {}", name, e))
                })?;

                files.push(UploadedFile {
                    name,
                    mime_type,
                    data: data.to_vec(),
                });
            }
            "provider" | "model" | "messages" => {
                let value = field.text().await.map_err(|e| {
                    ChatError::MalformedRequest(format!(
                        "Failed to read field {}: {}",
                        field_name, e
                    ))
                })?;

                let slot = match field_name.as_str() {
                    "provider" => &mut provider,
                    "model" => &mut model,
                    _ => &mut messages,
                };
                if slot.is_none() {
                    *slot = Some(value);
                }
            }
            _ => {}
        }
    }

    let messages = match messages {
        Some(raw) => parse_messages(&raw)?,
        None => Vec::new(),
    };

    Ok(ChatRequest {
        provider: provider.unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
        model: model.unwrap_or_default(),
        messages,
        files,
    })
}

fn parse_messages(raw: &str) -> Result<Vec<ChatTurn>, ChatError> {
    serde_json::from_str(raw)
        .map_err(|e| ChatError::MalformedRequest(format!("Invalid messages payload: {}", e)))
}
