//! External LLM completion for the mindmap pipeline.
//!
//! Non-streaming request/response calls to Anthropic or OpenAI-compatible
//! APIs. Retries are the caller's responsibility.

pub mod config;
pub mod error;
pub mod providers;
pub mod types;

pub use config::LLMConfig;
pub use error::ServiceError;
pub use providers::{CompletionClient, LlmClient};
pub use types::*;
