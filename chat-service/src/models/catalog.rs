//! Static catalog of models offered per provider.

use serde::Serialize;
use std::collections::BTreeMap;

/// Models offered for Gemini, in display order.
pub const GEMINI_MODELS: &[&str] = &[
    "gemini-2.0-flash",
    "gemini-2.0-flash-lite",
    "gemini-2.5-flash",
    "gemini-2.5-pro",
];

/// Provider name to ordered model identifiers. Only providers with a configured
/// credential are listed.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ModelCatalog(BTreeMap<String, Vec<String>>);

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: &str, models: &[&str]) -> Self {
        self.0.insert(
            provider.to_string(),
            models.iter().map(|m| m.to_string()).collect(),
        );
        self
    }

    pub fn models(&self, provider: &str) -> Option<&[String]> {
        self.0.get(provider).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
