//! Conversation turns as sent by the browser, and the provider-neutral
//! content entries they are assembled into.

use serde::{Deserialize, Serialize};

/// One message of the client-side conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// `"user"` for the human side; any other value is treated as the model.
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: "model".to_string(),
            content: content.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == "user"
    }
}

/// Author of a content entry, as understood by providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRole {
    User,
    Model,
}

/// A unit inside a content entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// Binary media embedded directly in the request.
    InlineMedia { mime_type: String, data: Vec<u8> },
}

impl Segment {
    pub fn is_inline_media(&self) -> bool {
        matches!(self, Segment::InlineMedia { .. })
    }
}

/// One entry of the conversation handed to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub role: ContentRole,
    pub parts: Vec<Segment>,
}
