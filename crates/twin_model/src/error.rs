//! Error types for model loading and schema checks.

use thiserror::Error;

/// Errors that can occur while loading or checking model documents.
#[derive(Debug, Error)]
pub enum Error {
    /// Document is well-typed but violates a schema constraint.
    #[error("schema violation: {0}")]
    Schema(String),

    /// File extension does not map to a supported format.
    #[error("unknown format: {0}")]
    UnknownFormat(String),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Creates a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;
