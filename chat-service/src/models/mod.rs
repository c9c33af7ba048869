//! Domain models for the chat service.

pub mod catalog;
pub mod chat;
pub mod envelope;
pub mod files;

pub use catalog::ModelCatalog;
pub use chat::{ChatTurn, Content, ContentRole, Segment};
pub use envelope::{GenerationResult, ResponseEnvelope, TokenUsage};
pub use files::{EncodedFile, FileMetadata, UploadedFile};
