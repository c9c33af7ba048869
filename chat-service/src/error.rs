//! Failures of the chat pipeline and their wire rendering.

use crate::models::ResponseEnvelope;
use crate::services::providers::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Every way a chat request can fail. The client only ever sees the message.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Proveedor '{0}' no soportado.")]
    UnsupportedProvider(String),

    #[error("Proveedor '{0}' no configurado.")]
    ProviderNotConfigured(String),

    #[error("{0}")]
    MalformedRequest(String),

    #[error("Uploaded files exceed the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::UnsupportedProvider(_) => "unsupported_provider",
            ChatError::ProviderNotConfigured(_) => "provider_not_configured",
            ChatError::MalformedRequest(_) => "malformed_request",
            ChatError::PayloadTooLarge { .. } => "payload_too_large",
            ChatError::Provider(_) => "provider_failure",
            ChatError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ResponseEnvelope::failure(self.to_string())),
        )
            .into_response()
    }
}
