//! Error types for policy parsing and validation.

use thiserror::Error;

/// Errors that can occur during policy operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A line does not follow the rule grammar.
    #[error("parse error at line {line}: {reason}")]
    Parse {
        /// Line number where the error occurred (1-based).
        line: usize,
        /// Reason for the parse failure.
        reason: String,
    },

    /// Port token is neither a number nor a `start-end` range.
    #[error("invalid port '{port}': {reason}")]
    InvalidPort {
        /// The offending port token.
        port: String,
        /// Reason why the port is invalid.
        reason: String,
    },

    /// Policy is well-formed but references things that do not exist.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Result type alias for policy operations.
pub type Result<T> = std::result::Result<T, Error>;
