//! HTTP handlers for the chat service.

pub mod chat;
pub mod health;
pub mod models;
pub mod pages;

pub use chat::chat;
pub use health::{health_check, metrics_endpoint};
pub use models::list_models;
pub use pages::index;
