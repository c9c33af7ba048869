//! Generation results and the JSON envelope returned for every chat request.

use super::files::FileMetadata;
use serde::Serialize;

/// Token counters for one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub input: u32,
    pub output: u32,
    pub total: u32,
    /// True when the counts come from the word-count heuristic rather than
    /// the provider's own accounting.
    pub estimated: bool,
}

impl TokenUsage {
    /// Counts reported by the provider, passed through unchanged.
    pub fn reported(input: u32, output: u32, total: u32) -> Self {
        Self {
            input,
            output,
            total,
            estimated: false,
        }
    }

    /// Rough approximation used when the provider reports no usage:
    /// twice the whitespace-separated word count of each side.
    ///
    /// This is not a tokenizer and can be far off for code or non-Latin text.
    pub fn estimate(user_text: &str, reply_text: &str) -> Self {
        let input = word_count(user_text).saturating_mul(2);
        let output = word_count(reply_text).saturating_mul(2);
        Self {
            input,
            output,
            total: input.saturating_add(output),
            estimated: true,
        }
    }
}

fn word_count(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}

/// Successful output of a provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub reply: String,
    pub tokens: TokenUsage,
    /// Normalized model identifier that was called.
    pub model: String,
    /// Human-readable provider name.
    pub provider: String,
}

/// The only shape that crosses the HTTP boundary for `/api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileMetadata>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    pub fn success(result: GenerationResult, files: Vec<FileMetadata>) -> Self {
        Self {
            success: true,
            reply: Some(result.reply),
            tokens: Some(result.tokens),
            model: Some(result.model),
            provider: Some(result.provider),
            files: Some(files),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            reply: None,
            tokens: None,
            model: None,
            provider: None,
            files: None,
            error: Some(message.into()),
        }
    }
}
