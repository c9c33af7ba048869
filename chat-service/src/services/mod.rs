pub mod conversation;
pub mod files;
pub mod metrics;
pub mod pipeline;
pub mod providers;

pub use pipeline::{ChatPipeline, ChatReply, ChatRequest};
