//! AI provider abstractions and implementations.
//!
//! This module provides a trait-based abstraction for generation providers,
//! allowing the pipeline to swap between backends (Gemini, mock).

pub mod gemini;
pub mod mock;

use crate::models::{Content, GenerationResult};
use async_trait::async_trait;
use thiserror::Error;

/// Output cap applied to every chat generation.
pub const MAX_OUTPUT_TOKENS: u32 = 2048;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),
}

impl ProviderError {
    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::InvalidRequest(_) => "invalid_request",
            ProviderError::NetworkError(_) => "network_error",
            ProviderError::EmptyResponse(_) => "empty_response",
        }
    }
}

/// Generation parameters for chat requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationParams {
    /// Maximum output tokens.
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_output_tokens: MAX_OUTPUT_TOKENS,
        }
    }
}

/// Everything a provider needs for one generation.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Normalized model identifier (no `models/` prefix).
    pub model_id: String,
    pub contents: Vec<Content>,
    /// Text of the current turn, used for the token estimate fallback.
    pub user_text: String,
    pub params: GenerationParams,
}

/// Trait for chat generation providers (e.g., Gemini).
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Key clients use in the `provider` form field.
    fn name(&self) -> &str;

    /// Human-readable name returned in the response envelope.
    fn display_name(&self) -> &str;

    /// Generate a reply for the assembled conversation. No retries.
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GenerationResult, ProviderError>;
}
