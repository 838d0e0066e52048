//! Error types for steam-harvest.
//!
//! Only input/output problems surface as errors from a batch run. Per-item
//! network and translation failures are absorbed by the loop and counted.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An input or checkpoint file could not be used.
    #[error("Invalid input file '{path}': {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Translation error: {0}")]
    Translate(String),
}

impl HarvestError {
    pub fn invalid_input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
