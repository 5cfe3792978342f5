//! State store adapter interface
//!
//! The manager only needs three primitives from durable storage: a
//! create-if-absent insert, a point read and a compare-and-swap update on the
//! state column. Anything that can provide those (a SQL table, a Cassandra
//! table with lightweight transactions, a key-value store) can back the
//! record state machine.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::{EtlRecordState, RecordKey};
use crate::state::EtlState;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStateStore;
pub use postgres::PgStateStore;

/// Durable storage for sink record states
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Insert a new row in [`EtlState::Ready`] unless one already exists.
    ///
    /// Returns [`StoreError::AlreadyExists`] when another writer created the
    /// row first; the existing row is left untouched.
    async fn create_if_absent(&self, key: &RecordKey) -> Result<EtlRecordState, StoreError>;

    /// Fetch the row for `key`, or [`StoreError::NotFound`]
    async fn get(&self, key: &RecordKey) -> Result<EtlRecordState, StoreError>;

    /// Set the state to `new_state` only if it is currently `expected`.
    ///
    /// Bumps `updated_at` and returns the new row. Returns
    /// [`StoreError::Conflict`] when the stored state differs from `expected`.
    async fn update(
        &self,
        key: &RecordKey,
        new_state: EtlState,
        expected: EtlState,
    ) -> Result<EtlRecordState, StoreError>;

    /// Rows of one pipeline, optionally filtered by state, oldest update first
    async fn list(
        &self,
        etl_signature: &str,
        state: Option<EtlState>,
    ) -> Result<Vec<EtlRecordState>, StoreError>;
}
