//! Uploaded attachments and the forms derived from them during a request.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;

/// A file part received in the chat form. Lives only for one request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name, unsanitized.
    pub name: String,
    /// Content type declared by the client, if any.
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Per-file information returned to the client for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMetadata {
    pub name: String,
    pub size: usize,
    pub size_readable: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// Base64 form of an accepted upload, consumed once by the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    pub name: String,
    pub mime_type: String,
    pub data_base64: String,
}

impl EncodedFile {
    pub fn encode(name: impl Into<String>, mime_type: impl Into<String>, data: &[u8]) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data_base64: BASE64.encode(data),
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(&self.data_base64)
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}
