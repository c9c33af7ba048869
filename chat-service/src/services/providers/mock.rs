//! Mock provider implementation for testing.

use super::{ChatProvider, GenerationRequest, ProviderError};
use crate::models::{GenerationResult, TokenUsage};
use async_trait::async_trait;
use std::sync::Mutex;

/// Mock chat provider for testing.
///
/// Echoes the current user text, or fails with a fixed message when built with
/// [`MockChatProvider::failing`]. The last request is kept for inspection.
pub struct MockChatProvider {
    name: String,
    failure: Option<String>,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl MockChatProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure: None,
            last_request: Mutex::new(None),
        }
    }

    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(name)
        }
    }

    /// The most recent request passed to `generate`.
    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        "Mock Provider"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, ProviderError> {
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        if let Some(message) = &self.failure {
            return Err(ProviderError::ApiError(message.clone()));
        }

        let reply = format!("Mock response for: {}", request.user_text);

        Ok(GenerationResult {
            tokens: TokenUsage::estimate(&request.user_text, &reply),
            reply,
            model: request.model_id.clone(),
            provider: self.display_name().to_string(),
        })
    }
}
