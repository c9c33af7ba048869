//! Gemini AI provider implementation.
//!
//! Calls the `generateContent` REST method of Google's Gemini API.

use super::{ChatProvider, GenerationParams, GenerationRequest, ProviderError};
use crate::config::GeminiSettings;
use crate::models::{Content, ContentRole, GenerationResult, Segment, TokenUsage};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const PROVIDER_NAME: &str = "gemini";
pub const PROVIDER_DISPLAY_NAME: &str = "Google Gemini";

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Secret<String>,
    pub api_base: String,
    pub timeout: Duration,
}

impl From<&GeminiSettings> for GeminiConfig {
    fn from(settings: &GeminiSettings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// Gemini chat provider.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Build the API URL for the given model and method.
    fn api_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.api_base, model, method)
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn display_name(&self) -> &str {
        PROVIDER_DISPLAY_NAME
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, ProviderError> {
        validate_model_id(&request.model_id)?;

        let body = build_request(&request.contents, &request.params);
        let url = self.api_url(&request.model_id, "generateContent");

        tracing::debug!(
            model = %request.model_id,
            content_count = request.contents.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status,
                api_error_message(&error_text)
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        let (reply, tokens) = interpret_response(api_response, &request.user_text)?;

        if tokens.estimated {
            tracing::debug!(
                model = %request.model_id,
                "Gemini reported no usage metadata; token counts are estimated"
            );
        }

        Ok(GenerationResult {
            reply,
            tokens,
            model: request.model_id.clone(),
            provider: PROVIDER_DISPLAY_NAME.to_string(),
        })
    }
}

/// Model ids end up as a URL path segment, so only `[A-Za-z0-9._-]` is
/// accepted and dot-only ids are refused.
fn validate_model_id(model_id: &str) -> Result<(), ProviderError> {
    let safe_chars = model_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if model_id.is_empty() || !safe_chars || model_id.chars().all(|c| c == '.') {
        return Err(ProviderError::InvalidRequest(format!(
            "Invalid model identifier '{}'",
            model_id
        )));
    }

    Ok(())
}

fn build_request(contents: &[Content], params: &GenerationParams) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: contents.iter().map(WireContent::from).collect(),
        generation_config: GenerationConfig {
            max_output_tokens: params.max_output_tokens,
        },
    }
}

/// Extract the reply text and token usage from a successful response.
///
/// The reply is the concatenated text of the first candidate. Usage comes from
/// `usageMetadata` when all three counters are present, otherwise it is
/// estimated from word counts.
fn interpret_response(
    response: GenerateContentResponse,
    user_text: &str,
) -> Result<(String, TokenUsage), ProviderError> {
    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        ProviderError::EmptyResponse(reason)
    })?;

    let reply: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|part| !part.thought.unwrap_or(false))
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    let tokens = match response.usage_metadata {
        Some(UsageMetadata {
            prompt_token_count: Some(input),
            candidates_token_count: Some(output),
            total_token_count: Some(total),
        }) => TokenUsage::reported(input, output, total),
        _ => TokenUsage::estimate(user_text, &reply),
    };

    Ok((reply, tokens))
}

/// Pull `error.message` out of a Gemini error body, falling back to the raw text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<WireContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct WireContent {
    role: &'static str,
    parts: Vec<WirePart>,
}

impl From<&Content> for WireContent {
    fn from(content: &Content) -> Self {
        Self {
            role: match content.role {
                ContentRole::User => "user",
                ContentRole::Model => "model",
            },
            parts: content.parts.iter().map(WirePart::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl From<&Segment> for WirePart {
    fn from(segment: &Segment) -> Self {
        match segment {
            Segment::Text(text) => WirePart::Text { text: text.clone() },
            Segment::InlineMedia { mime_type, data } => WirePart::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.clone(),
                    data: BASE64.encode(data),
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}
