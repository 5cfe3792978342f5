//! Error types for state stores and record managers

use thiserror::Error;

use crate::db::{map_migrate_error, map_sqlx_error};
use crate::record::RecordKey;
use crate::state::{EtlState, IllegalTransition};

/// Result type alias for manager operations
pub type StateResult<T> = std::result::Result<T, StateError>;

/// Failures reported by a [`StateStore`](crate::store::StateStore) adapter
#[derive(Error, Debug)]
pub enum StoreError {
    /// Conditional create lost: a row already exists for this key
    #[error("Record state {0} already exists")]
    AlreadyExists(RecordKey),

    #[error("Record state {0} not found")]
    NotFound(RecordKey),

    /// Compare-and-swap update found a different state than expected
    #[error(
        "Conflicting update on {key} to '{proposed}': expected state '{expected}', found {}",
        display_actual(.actual)
    )]
    Conflict {
        key: RecordKey,
        expected: EtlState,
        proposed: EtlState,
        actual: Option<EtlState>,
    },

    #[error("State store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(sqlx::migrate::MigrateError),

    /// A stored row could not be decoded (e.g. unknown state string)
    #[error("Corrupt state row for {key}: {reason}")]
    CorruptRow { key: RecordKey, reason: String },
}

fn display_actual(actual: &Option<EtlState>) -> String {
    match actual {
        Some(state) => format!("'{}'", state),
        None => "no row".to_string(),
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        map_sqlx_error(err)
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        map_migrate_error(err)
    }
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Errors surfaced to callers of the record manager
#[derive(Error, Debug)]
pub enum StateError {
    /// Business-rule violation; the stored row was not touched
    #[error("Record {key}: {source}")]
    IllegalTransition {
        key: RecordKey,
        #[source]
        source: IllegalTransition,
    },

    /// Infrastructure failure, propagated verbatim from the store
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl StateError {
    pub fn is_illegal_transition(&self) -> bool {
        matches!(self, StateError::IllegalTransition { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StateError::Store(err) if err.is_conflict())
    }

    /// The rejected transition, if this is a business-rule error
    pub fn illegal_transition(&self) -> Option<&IllegalTransition> {
        match self {
            StateError::IllegalTransition { source, .. } => Some(source),
            StateError::Store(_) => None,
        }
    }
}
