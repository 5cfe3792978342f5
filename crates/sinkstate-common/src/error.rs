//! Error types shared across SinkState crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised by shared helpers (configuration, signatures)
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Invalid record signature: {0}")]
    InvalidSignature(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CommonError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
