//! Error types for simulation operations.

use thiserror::Error;

/// Errors that can occur outside the infallible simulation path.
#[derive(Debug, Error)]
pub enum Error {
    /// A node id does not exist in the topology.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// Model loading or schema error.
    #[error(transparent)]
    Model(#[from] twin_model::Error),
}

/// Result type alias for simulation operations.
pub type Result<T> = std::result::Result<T, Error>;
