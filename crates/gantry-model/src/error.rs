//! Error types for the model crate

use thiserror::Error;

/// Errors from encoding, decoding, or storing model documents
#[derive(Debug, Error)]
pub enum ModelError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
