//! Error types for the SinkState CLI
//!
//! Messages are user-facing and say what to check next.

use sinkstate_core::{RecordKey, StateError, StoreError};
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// No row for the requested record
    #[error("Record '{0}' not found. Check the ETL signature and record identifier with 'sinkstate list'.")]
    NotFound(RecordKey),

    /// The state machine refused the change
    #[error("{0}. Run 'sinkstate show' to see the current state.")]
    Transition(StateError),

    /// The state store could not complete the request
    #[error("State store error: {0}. Check your database connection settings.")]
    Store(StoreError),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your environment variables or .env file.")]
    Config(String),

    /// Some records of a multi-record command could not be processed
    #[error("{failed} of {total} records could not be processed")]
    PartialFailure { failed: usize, total: usize },

    /// JSON output failed
    #[error("Failed to write JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => CliError::NotFound(key),
            other => CliError::Store(other),
        }
    }
}

impl From<StateError> for CliError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::Store(store) => store.into(),
            transition => CliError::Transition(transition),
        }
    }
}

impl CliError {
    pub fn config(msg: impl Into<String>) -> Self {
        CliError::Config(msg.into())
    }
}
