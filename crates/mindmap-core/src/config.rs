//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Shortest prompt accepted by the HTTP surface.
pub const MIN_PROMPT_CHARS: usize = 10;
/// Longest prompt accepted by the HTTP surface.
pub const MAX_PROMPT_CHARS: usize = 2000;

pub const DEFAULT_PORT: u16 = 8000;

/// Paths to the generator's data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// LLM configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            llm_config_file: root.join("llm-config.json"),
            root,
        })
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MindmapConfig {
    /// Interface the HTTP server binds to.
    pub host: String,
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Inclusive prompt length bounds, in characters.
    pub min_prompt_chars: usize,
    pub max_prompt_chars: usize,
}

impl MindmapConfig {
    /// Create configuration from environment and defaults.
    ///
    /// An unset or blank `PORT` means 8000; any other non-port value is a
    /// `Config` error.
    pub fn from_env(data_dir: impl AsRef<Path>) -> crate::Result<Self> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_port(std::env::var("PORT").ok().as_deref())?;

        Ok(Self {
            host,
            port,
            data_paths: DataPaths::new(data_dir)?,
            min_prompt_chars: MIN_PROMPT_CHARS,
            max_prompt_chars: MAX_PROMPT_CHARS,
        })
    }

    /// Socket address string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check a prompt against the configured length bounds.
    ///
    /// Whitespace-only prompts are rejected as empty before the length check.
    pub fn check_prompt(&self, prompt: &str) -> crate::Result<()> {
        if prompt.trim().is_empty() {
            return Err(crate::Error::EmptyPrompt);
        }
        let len = prompt.chars().count();
        if len < self.min_prompt_chars || len > self.max_prompt_chars {
            return Err(crate::Error::InvalidPrompt(format!(
                "prompt must be between {} and {} characters, got {}",
                self.min_prompt_chars, self.max_prompt_chars, len
            )));
        }
        Ok(())
    }
}

fn parse_port(value: Option<&str>) -> crate::Result<u16> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(DEFAULT_PORT),
        Some(v) => v
            .parse()
            .map_err(|_| crate::Error::Config(format!("PORT must be a port number, got '{v}'"))),
    }
}
