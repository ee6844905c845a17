//! Mindmap core: error type and service configuration shared by every crate.

pub mod config;
pub mod error;

pub use config::{DataPaths, MindmapConfig};
pub use error::{Error, Result};
