//! Error types for the mindmap generator.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No LLM credential configured: {0}")]
    MissingCredential(String),

    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("Invalid prompt: {0}")]
    InvalidPrompt(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
