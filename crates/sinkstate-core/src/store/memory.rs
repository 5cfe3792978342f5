//! In-process state store
//!
//! Used by tests and by single-process ETLs that do not need durability.
//! All writes go through one `RwLock`, which gives the same create-if-absent
//! and compare-and-swap guarantees as the SQL adapter.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::StateStore;
use crate::error::StoreError;
use crate::record::{EtlRecordState, RecordKey};
use crate::state::EtlState;

#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    rows: RwLock<HashMap<RecordKey, EtlRecordState>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn create_if_absent(&self, key: &RecordKey) -> Result<EtlRecordState, StoreError> {
        let mut rows = self.rows.write().await;
        match rows.entry(key.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(key.clone())),
            Entry::Vacant(slot) => Ok(slot
                .insert(EtlRecordState::new_ready(key, Utc::now()))
                .clone()),
        }
    }

    async fn get(&self, key: &RecordKey) -> Result<EtlRecordState, StoreError> {
        self.rows
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn update(
        &self,
        key: &RecordKey,
        new_state: EtlState,
        expected: EtlState,
    ) -> Result<EtlRecordState, StoreError> {
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(key).ok_or_else(|| StoreError::NotFound(key.clone()))?;

        if row.state != expected {
            return Err(StoreError::Conflict {
                key: key.clone(),
                expected,
                proposed: new_state,
                actual: Some(row.state),
            });
        }

        row.state = new_state;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn list(
        &self,
        etl_signature: &str,
        state: Option<EtlState>,
    ) -> Result<Vec<EtlRecordState>, StoreError> {
        let rows = self.rows.read().await;
        let mut matching: Vec<EtlRecordState> = rows
            .values()
            .filter(|row| row.etl_signature == etl_signature)
            .filter(|row| state.map_or(true, |s| row.state == s))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            a.updated_at
                .cmp(&b.updated_at)
                .then_with(|| a.record_identifier.cmp(&b.record_identifier))
        });

        Ok(matching)
    }
}
