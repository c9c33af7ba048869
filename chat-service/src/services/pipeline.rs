//! The chat request pipeline: validate uploads, pick the provider, assemble
//! the conversation, call the provider.

use super::conversation::{assemble, current_text, normalize_model_id};
use super::files::prepare_uploads;
use super::providers::{ChatProvider, GenerationParams, GenerationRequest};
use crate::error::ChatError;
use crate::models::{ChatTurn, FileMetadata, GenerationResult, UploadedFile};
use crate::services::metrics;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Provider keys the service knows about, whether or not a credential is set.
pub const KNOWN_PROVIDERS: &[&str] = &["gemini"];

pub const DEFAULT_PROVIDER: &str = "gemini";

/// One parsed `/api/chat` request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub provider: String,
    /// Empty means "use the configured default model".
    pub model: String,
    pub messages: Vec<ChatTurn>,
    pub files: Vec<UploadedFile>,
}

/// Successful pipeline output: the generation plus metadata of every accepted
/// file, including the ones not forwarded to the provider.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub result: GenerationResult,
    pub files: Vec<FileMetadata>,
}

/// Stateless pipeline shared by all requests.
#[derive(Clone)]
pub struct ChatPipeline {
    providers: HashMap<String, Arc<dyn ChatProvider>>,
    default_model: String,
    max_upload_bytes: usize,
    params: GenerationParams,
}

impl ChatPipeline {
    pub fn new(default_model: impl Into<String>, max_upload_bytes: usize) -> Self {
        Self {
            providers: HashMap::new(),
            default_model: default_model.into(),
            max_upload_bytes,
            params: GenerationParams::default(),
        }
    }

    /// Register a provider under its `name()`.
    pub fn with_provider(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        self.providers.insert(provider.name().to_string(), provider);
        self
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub async fn run(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        let provider_name = request.provider.clone();
        let outcome = self.execute(request).await;
        metrics::record_chat_outcome(&provider_name, outcome.as_ref().map(|_| ()));
        outcome
    }

    async fn execute(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        let uploads = prepare_uploads(request.files, self.max_upload_bytes)?;
        metrics::record_files(uploads.metadata.len(), uploads.skipped);

        let provider = self.resolve_provider(&request.provider)?;

        let model = if request.model.is_empty() {
            self.default_model.as_str()
        } else {
            request.model.as_str()
        };

        let generation = GenerationRequest {
            model_id: normalize_model_id(model),
            contents: assemble(&request.messages, &uploads.encoded)?,
            user_text: current_text(&request.messages).to_string(),
            params: self.params,
        };

        tracing::info!(
            provider = %provider.name(),
            model = %generation.model_id,
            history_len = request.messages.len().saturating_sub(1),
            attachments = uploads.metadata.len(),
            "Forwarding chat to provider"
        );

        let started = Instant::now();
        let result = provider.generate(&generation).await;
        metrics::record_provider_latency(provider.name(), &generation.model_id, started.elapsed());

        let result = result.map_err(|e| {
            metrics::record_provider_error(provider.name(), e.kind());
            tracing::warn!(
                provider = %provider.name(),
                model = %generation.model_id,
                error = %e,
                "Provider call failed"
            );
            ChatError::from(e)
        })?;

        metrics::record_tokens(provider.name(), &result.model, &result.tokens);

        Ok(ChatReply {
            result,
            files: uploads.metadata,
        })
    }

    fn resolve_provider(&self, name: &str) -> Result<&Arc<dyn ChatProvider>, ChatError> {
        match self.providers.get(name) {
            Some(provider) => Ok(provider),
            None if KNOWN_PROVIDERS.contains(&name) => {
                Err(ChatError::ProviderNotConfigured(name.to_string()))
            }
            None => Err(ChatError::UnsupportedProvider(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Segment;
    use crate::services::providers::mock::MockChatProvider;

    fn request(provider: &str, model: &str, messages: Vec<ChatTurn>) -> ChatRequest {
        ChatRequest {
            provider: provider.to_string(),
            model: model.to_string(),
            messages,
            files: Vec::new(),
        }
    }

    fn pipeline_with(provider: Arc<MockChatProvider>) -> ChatPipeline {
        ChatPipeline::new("gemini-2.5-flash", 1024).with_provider(provider)
    }

    #[tokio::test]
    async fn unknown_provider_fails_without_calling_anything() {
        let mock = Arc::new(MockChatProvider::new("gemini"));
        let pipeline = pipeline_with(mock.clone());

        let err = pipeline
            .run(request("unknown", "", vec![ChatTurn::user("hi")]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Proveedor 'unknown' no soportado.");
        assert!(mock.last_request().is_none());
    }

    #[tokio::test]
    async fn known_provider_without_credential_is_reported() {
        let pipeline = ChatPipeline::new("gemini-2.5-flash", 1024);

        let err = pipeline
            .run(request("gemini", "", vec![ChatTurn::user("hi")]))
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::ProviderNotConfigured(ref p) if p == "gemini"));
    }

    #[tokio::test]
    async fn empty_model_uses_default_and_prefix_is_stripped() {
        let mock = Arc::new(MockChatProvider::new("gemini"));
        let pipeline = pipeline_with(mock.clone());

        let reply = pipeline
            .run(request("gemini", "", vec![ChatTurn::user("hi")]))
            .await
            .unwrap();
        assert_eq!(reply.result.model, "gemini-2.5-flash");

        let reply = pipeline
            .run(request("gemini", "models/gemini-2.5-pro", vec![ChatTurn::user("hi")]))
            .await
            .unwrap();
        assert_eq!(reply.result.model, "gemini-2.5-pro");
        assert_eq!(mock.last_request().unwrap().model_id, "gemini-2.5-pro");
    }

    #[tokio::test]
    async fn history_and_images_reach_the_provider() {
        let mock = Arc::new(MockChatProvider::new("gemini"));
        let pipeline = pipeline_with(mock.clone());

        let mut req = request(
            "gemini",
            "",
            vec![
                ChatTurn::user("first"),
                ChatTurn::model("answer"),
                ChatTurn::user("look at this"),
            ],
        );
        req.files = vec![
            UploadedFile {
                name: "photo.png".to_string(),
                mime_type: Some("image/png".to_string()),
                data: vec![1, 2, 3],
            },
            UploadedFile {
                name: "notes.txt".to_string(),
                mime_type: Some("text/plain".to_string()),
                data: b"hello".to_vec(),
            },
            UploadedFile {
                name: "archive.zip".to_string(),
                mime_type: Some("application/zip".to_string()),
                data: vec![0; 4],
            },
        ];

        let reply = pipeline.run(req).await.unwrap();

        let names: Vec<_> = reply.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["photo.png", "notes.txt"]);

        let sent = mock.last_request().unwrap();
        assert_eq!(sent.user_text, "look at this");
        assert_eq!(sent.params.max_output_tokens, 2048);
        assert_eq!(sent.contents.len(), 3);

        let current = &sent.contents[2].parts;
        assert_eq!(current.iter().filter(|p| p.is_inline_media()).count(), 1);
        assert_eq!(current.last(), Some(&Segment::Text("look at this".to_string())));
    }

    #[tokio::test]
    async fn provider_failure_becomes_chat_error_with_message() {
        let mock = Arc::new(MockChatProvider::failing("gemini", "quota exhausted"));
        let pipeline = pipeline_with(mock);

        let err = pipeline
            .run(request("gemini", "", vec![ChatTurn::user("hi")]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "provider_failure");
        assert_eq!(err.to_string(), "API error: quota exhausted");
    }

    #[tokio::test]
    async fn oversized_uploads_are_rejected_before_the_provider() {
        let mock = Arc::new(MockChatProvider::new("gemini"));
        let pipeline = pipeline_with(mock.clone());

        let mut req = request("gemini", "", vec![ChatTurn::user("hi")]);
        req.files = vec![UploadedFile {
            name: "huge.png".to_string(),
            mime_type: Some("image/png".to_string()),
            data: vec![0; 2048],
        }];

        let err = pipeline.run(req).await.unwrap_err();
        assert!(matches!(err, ChatError::PayloadTooLarge { limit: 1024 }));
        assert!(mock.last_request().is_none());
    }
}
