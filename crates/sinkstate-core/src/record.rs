//! Persisted record types (maps to the etl_sink_record_state table)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::EtlState;

/// Identity of a sink record: one row per (etl_signature, record_identifier)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    /// Logical ETL pipeline this record belongs to
    pub etl_signature: String,
    /// Natural key of the business record within the pipeline
    pub record_identifier: String,
}

impl RecordKey {
    pub fn new(etl_signature: impl Into<String>, record_identifier: impl Into<String>) -> Self {
        Self {
            etl_signature: etl_signature.into(),
            record_identifier: record_identifier.into(),
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.etl_signature, self.record_identifier)
    }
}

/// One persisted state row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtlRecordState {
    pub etl_signature: String,
    pub record_identifier: String,
    pub state: EtlState,
    /// Set once when the row is first created
    pub created_at: DateTime<Utc>,
    /// Bumped on every state transition
    pub updated_at: DateTime<Utc>,
}

impl EtlRecordState {
    /// A fresh row in [`EtlState::Ready`]
    pub fn new_ready(key: &RecordKey, now: DateTime<Utc>) -> Self {
        Self {
            etl_signature: key.etl_signature.clone(),
            record_identifier: key.record_identifier.clone(),
            state: EtlState::Ready,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.etl_signature, &self.record_identifier)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let key = RecordKey::new("offline-conversions", "gclid||purchase||2024-01-18");
        assert_eq!(key.to_string(), "offline-conversions/gclid||purchase||2024-01-18");
    }

    #[test]
    fn test_new_ready_row() {
        let key = RecordKey::new("etl-A", "rec-1");
        let now = Utc::now();
        let row = EtlRecordState::new_ready(&key, now);

        assert_eq!(row.state, EtlState::Ready);
        assert_eq!(row.created_at, row.updated_at);
        assert_eq!(row.key(), key);
    }
}
