//! Prompt-to-mindmap generation pipeline.
//!
//! Four sequential stages turn a prompt into mindmap XML:
//! concept extraction, layout structuring, markup generation and markup
//! validation. Each stage degrades to a deterministic fallback instead of
//! failing the request.

pub mod fallback;
mod lenient;
pub mod markup;
pub mod pipeline;
pub mod prompts;
pub mod sanitize;
pub mod service;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use fallback::Domain;
pub use markup::{MarkupDocument, MarkupSummary};
pub use pipeline::{MindmapGenerator, Stage, StageError};
pub use service::{GenerateResponse, MindmapService, ValidateResponse};
pub use types::*;
