//! Per-record state manager
//!
//! Binds one `(etl_signature, record_identifier)` pair to its persisted row
//! and exposes the lifecycle transitions. The manager caches the row it last
//! read or wrote: [`SinkRecordStateManager::current_state`] never touches the
//! store, and a state change made by another process only becomes visible
//! after [`SinkRecordStateManager::refresh`]. A stale cache cannot corrupt the
//! row, because every write is a compare-and-swap on the cached state.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{StateError, StateResult, StoreError};
use crate::record::{EtlRecordState, RecordKey};
use crate::state::EtlState;
use crate::store::StateStore;

/// Lifecycle façade for one sink record
pub struct SinkRecordStateManager {
    store: Arc<dyn StateStore>,
    key: RecordKey,
    record: EtlRecordState,
}

impl std::fmt::Debug for SinkRecordStateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkRecordStateManager")
            .field("key", &self.key)
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

impl SinkRecordStateManager {
    /// Bind to the row for this record, creating it in `Ready` if needed.
    ///
    /// Concurrent callers with the same key all end up on the same row: the
    /// losers of the conditional insert fetch the winner's row instead.
    #[instrument(skip(store))]
    pub async fn new(
        store: Arc<dyn StateStore>,
        record_identifier: &str,
        etl_signature: &str,
    ) -> StateResult<Self> {
        let key = RecordKey::new(etl_signature, record_identifier);

        let record = match store.create_if_absent(&key).await {
            Ok(created) => {
                debug!("Created record state");
                created
            },
            Err(StoreError::AlreadyExists(_)) => {
                let existing = store.get(&key).await?;
                debug!(state = %existing.state, "Bound to existing record state");
                existing
            },
            Err(err) => return Err(err.into()),
        };

        Ok(Self { store, key, record })
    }

    /// State of the bound row as last fetched or written
    pub fn current_state(&self) -> EtlState {
        self.record.state
    }

    /// Re-read the row from the store and return its state
    pub async fn refresh(&mut self) -> StateResult<EtlState> {
        self.record = self.store.get(&self.key).await?;
        Ok(self.record.state)
    }

    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    pub fn etl_signature(&self) -> &str {
        &self.key.etl_signature
    }

    pub fn record_identifier(&self) -> &str {
        &self.key.record_identifier
    }

    /// The cached row
    pub fn record(&self) -> &EtlRecordState {
        &self.record
    }

    /// Mark the record ready again (only from `Failed`)
    pub async fn ready(&mut self) -> StateResult<()> {
        self.change_state(EtlState::Ready).await
    }

    /// Claim the record for processing (only from `Ready`)
    pub async fn processing(&mut self) -> StateResult<()> {
        self.change_state(EtlState::Processing).await
    }

    pub async fn succeeded(&mut self) -> StateResult<()> {
        self.change_state(EtlState::Succeeded).await
    }

    pub async fn failed(&mut self) -> StateResult<()> {
        self.change_state(EtlState::Failed).await
    }

    /// Move to `new_state` if the transition table allows it
    #[instrument(skip(self), fields(key = %self.key, from = %self.record.state))]
    pub async fn change_state(&mut self, new_state: EtlState) -> StateResult<()> {
        let current = self.record.state;

        if let Err(source) = current.validate_transition(new_state) {
            warn!(error = %source, "Rejected state transition");
            return Err(StateError::IllegalTransition {
                key: self.key.clone(),
                source,
            });
        }

        self.record = self.store.update(&self.key, new_state, current).await?;
        info!(to = %new_state, "Record state changed");

        Ok(())
    }
}
