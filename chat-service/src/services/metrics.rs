//! Chat-specific metrics.
//!
//! Recorded through the `metrics` facade; the Prometheus recorder is installed
//! by `service_core::observability::init_metrics`. Provider and model labels
//! are mapped onto fixed sets so client input cannot mint new series.

use crate::error::ChatError;
use crate::models::catalog::GEMINI_MODELS;
use crate::models::TokenUsage;
use crate::services::pipeline::KNOWN_PROVIDERS;
use metrics::{counter, histogram};
use std::time::Duration;

const UNSUPPORTED_PROVIDER_LABEL: &str = "unsupported";
const OTHER_MODEL_LABEL: &str = "other";

/// Label for a provider name: the name itself when known, `"unsupported"`
/// otherwise.
pub fn provider_label(provider: &str) -> &'static str {
    KNOWN_PROVIDERS
        .iter()
        .find(|known| **known == provider)
        .copied()
        .unwrap_or(UNSUPPORTED_PROVIDER_LABEL)
}

/// Label for a model id: the id when it is in the catalog, `"other"` otherwise.
pub fn model_label(model: &str) -> &'static str {
    GEMINI_MODELS
        .iter()
        .find(|known| **known == model)
        .copied()
        .unwrap_or(OTHER_MODEL_LABEL)
}

/// Record the outcome of one chat request.
pub fn record_chat_outcome(provider: &str, outcome: Result<(), &ChatError>) {
    let outcome = match outcome {
        Ok(()) => "success",
        Err(e) => e.kind(),
    };

    counter!(
        "chat_requests_total",
        "provider" => provider_label(provider),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record provider call latency.
pub fn record_provider_latency(provider: &str, model: &str, elapsed: Duration) {
    histogram!(
        "chat_provider_latency_seconds",
        "provider" => provider_label(provider),
        "model" => model_label(model)
    )
    .record(elapsed.as_secs_f64());
}

/// Record a failed provider call.
pub fn record_provider_error(provider: &str, kind: &'static str) {
    counter!(
        "chat_provider_errors_total",
        "provider" => provider_label(provider),
        "kind" => kind
    )
    .increment(1);
}

/// Record token consumption, split by input and output.
pub fn record_tokens(provider: &str, model: &str, tokens: &TokenUsage) {
    let provider = provider_label(provider);
    let model = model_label(model);
    let estimated = if tokens.estimated { "true" } else { "false" };

    counter!(
        "chat_tokens_total",
        "provider" => provider,
        "model" => model,
        "type" => "input",
        "estimated" => estimated
    )
    .increment(u64::from(tokens.input));

    counter!(
        "chat_tokens_total",
        "provider" => provider,
        "model" => model,
        "type" => "output",
        "estimated" => estimated
    )
    .increment(u64::from(tokens.output));
}

/// Record accepted and skipped uploads.
pub fn record_files(accepted: usize, skipped: usize) {
    counter!("chat_files_total", "outcome" => "accepted").increment(accepted as u64);
    counter!("chat_files_total", "outcome" => "skipped").increment(skipped as u64);
}
