//! Sink batch guard
//!
//! Wraps an external, side-effecting upload (e.g. offline conversions sent to
//! an ad network) with per-record state tracking:
//!
//! 1. Verify: each record is claimed through its manager (`Ready → Processing`).
//!    Records that are already in flight, already uploaded, failed and not yet
//!    reset, or duplicated within the batch are reported as issues and skipped.
//! 2. Chunk the claimed records into destination-sized batches.
//! 3. Upload each batch and mark every record `Succeeded` or `Failed`.
//!
//! A bad record never aborts the run; it ends up in [`BatchReport::issues`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use sinkstate_common::CommonError;

use crate::config::EtlConfig;
use crate::error::{StateError, StateResult, StoreError};
use crate::manager::SinkRecordStateManager;
use crate::state::{EtlState, IllegalTransition};
use crate::store::StateStore;

/// A record that can be tracked in the state store
pub trait SinkRecord {
    /// Stable natural key of the record within its ETL
    fn record_identifier(&self) -> String;
}

/// Destination response for one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "response", rename_all = "snake_case")]
pub enum UploadResult {
    Accepted(Value),
    Rejected(Value),
}

/// External destination receiving batches of records
#[async_trait]
pub trait RecordSink<R: Sync>: Send + Sync {
    /// Upload one batch; must return exactly one result per record, in order
    async fn upload(&self, batch: &[R]) -> anyhow::Result<Vec<UploadResult>>;
}

/// Why a record could not be processed
#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
    /// Record was not in a state that allows this step
    IllegalTransition(IllegalTransition),
    /// State store failure while tracking the record
    Store(StoreIssue),
    /// Destination failed for the whole batch the record was in
    Sink(String),
}

impl From<StateError> for IssueKind {
    fn from(err: StateError) -> Self {
        match err {
            StateError::IllegalTransition { source, .. } => IssueKind::IllegalTransition(source),
            StateError::Store(store) => IssueKind::Store(store.into()),
        }
    }
}

/// State store failure, kept typed so callers can tell races from outages
#[derive(Debug, Clone, PartialEq)]
pub enum StoreIssue {
    /// Another writer moved the record first
    Conflict {
        expected: EtlState,
        proposed: EtlState,
        actual: Option<EtlState>,
    },
    NotFound,
    /// Store could not be reached; the record may be retried as is
    Unavailable(String),
    /// Any other store failure
    Failed(String),
}

impl From<StoreError> for StoreIssue {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict {
                expected,
                proposed,
                actual,
                ..
            } => StoreIssue::Conflict {
                expected,
                proposed,
                actual,
            },
            StoreError::NotFound(_) => StoreIssue::NotFound,
            StoreError::Unavailable(reason) => StoreIssue::Unavailable(reason),
            other => StoreIssue::Failed(other.to_string()),
        }
    }
}

impl std::fmt::Display for StoreIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreIssue::Conflict {
                expected,
                proposed,
                actual: Some(actual),
            } => write!(
                f,
                "conflict moving to '{}': expected '{}', found '{}'",
                proposed, expected, actual
            ),
            StoreIssue::Conflict {
                expected, proposed, ..
            } => write!(
                f,
                "conflict moving to '{}': expected '{}', found no row",
                proposed, expected
            ),
            StoreIssue::NotFound => write!(f, "record state not found"),
            StoreIssue::Unavailable(reason) => write!(f, "unavailable: {}", reason),
            StoreIssue::Failed(reason) => f.write_str(reason),
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueKind::IllegalTransition(t) => write!(f, "illegal transition: {}", t),
            IssueKind::Store(msg) => write!(f, "state store error: {}", msg),
            IssueKind::Sink(msg) => write!(f, "sink error: {}", msg),
        }
    }
}

/// A per-record problem, carrying the record itself
#[derive(Debug)]
pub struct Issue<R> {
    pub record_identifier: String,
    pub error: IssueKind,
    pub data: R,
}

impl<R: SinkRecord> Issue<R> {
    pub fn new(data: R, error: IssueKind) -> Self {
        Self {
            record_identifier: data.record_identifier(),
            error,
            data,
        }
    }
}

/// Outcome of one run; every submitted record lands in exactly one list
#[derive(Debug)]
pub struct BatchReport<R> {
    pub issues: Vec<Issue<R>>,
    pub successes: Vec<Value>,
    pub failures: Vec<Value>,
}

impl<R> Default for BatchReport<R> {
    fn default() -> Self {
        Self {
            issues: Vec::new(),
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<R> BatchReport<R> {
    pub fn submitted(&self) -> usize {
        self.issues.len() + self.successes.len() + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.failures.is_empty()
    }

    pub fn merge(&mut self, other: BatchReport<R>) {
        self.issues.extend(other.issues);
        self.successes.extend(other.successes);
        self.failures.extend(other.failures);
    }

    pub fn log_summary(&self) {
        if !self.issues.is_empty() {
            warn!(count = self.issues.len(), "There were verification issues");
            for issue in &self.issues {
                debug!(record_identifier = %issue.record_identifier, error = %issue.error, "Issue");
            }
        }

        if let Some(sample) = self.failures.first() {
            warn!(count = self.failures.len(), "There were failures uploading to the sink");
            info!(sample = %sample, "Sample failure");
        }

        info!(
            "There were {} records successfully uploaded from a total of {} submitted items",
            self.successes.len(),
            self.submitted()
        );
    }
}

/// Settings for a [`SinkBatchProcessor`]
#[derive(Debug, Clone)]
pub struct SinkBatchConfig {
    pub etl_signature: String,
    pub destination_batch_size: usize,
}

impl SinkBatchConfig {
    pub fn new(
        etl_signature: impl Into<String>,
        destination_batch_size: usize,
    ) -> Result<Self, CommonError> {
        let etl_signature = etl_signature.into();
        if etl_signature.trim().is_empty() {
            return Err(CommonError::config("etl_signature cannot be empty"));
        }
        if destination_batch_size == 0 {
            return Err(CommonError::config(
                "destination_batch_size must be greater than 0",
            ));
        }
        Ok(Self {
            etl_signature,
            destination_batch_size,
        })
    }

    pub fn from_config(config: &EtlConfig) -> Result<Self, CommonError> {
        Self::new(config.etl_signature.clone(), config.destination_batch_size)
    }
}

/// Runs batches of records through a sink under state-machine protection
pub struct SinkBatchProcessor<K> {
    store: Arc<dyn StateStore>,
    sink: K,
    config: SinkBatchConfig,
}

impl<K> SinkBatchProcessor<K> {
    pub fn new(store: Arc<dyn StateStore>, sink: K, config: SinkBatchConfig) -> Self {
        Self { store, sink, config }
    }

    pub fn config(&self) -> &SinkBatchConfig {
        &self.config
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Manager for one record of this ETL
    pub async fn manager_for<R: SinkRecord>(&self, record: &R) -> StateResult<SinkRecordStateManager> {
        SinkRecordStateManager::new(
            self.store.clone(),
            &record.record_identifier(),
            &self.config.etl_signature,
        )
        .await
    }

    async fn claim<R: SinkRecord>(&self, record: &R) -> StateResult<SinkRecordStateManager> {
        let mut manager = self.manager_for(record).await?;
        manager.processing().await?;
        Ok(manager)
    }

    /// Verify, upload and mark a set of records
    #[instrument(
        skip_all,
        fields(
            run_id = %Uuid::new_v4(),
            etl_signature = %self.config.etl_signature,
            submitted = records.len()
        )
    )]
    pub async fn process<R>(&self, records: Vec<R>) -> BatchReport<R>
    where
        R: SinkRecord + Send + Sync,
        K: RecordSink<R>,
    {
        let mut report = BatchReport::default();
        let mut claimed = Vec::with_capacity(records.len());

        for record in records {
            match self.claim(&record).await {
                Ok(manager) => claimed.push((manager, record)),
                Err(err) => report.issues.push(Issue::new(record, err.into())),
            }
        }

        debug!(
            claimed = claimed.len(),
            skipped = report.issues.len(),
            "Verification finished"
        );

        let mut pending = claimed.into_iter().peekable();
        while pending.peek().is_some() {
            let chunk: Vec<_> = pending
                .by_ref()
                .take(self.config.destination_batch_size)
                .collect();
            self.upload_chunk(chunk, &mut report).await;
        }

        report
    }

    async fn upload_chunk<R>(
        &self,
        chunk: Vec<(SinkRecordStateManager, R)>,
        report: &mut BatchReport<R>,
    ) where
        R: SinkRecord + Send + Sync,
        K: RecordSink<R>,
    {
        let (managers, batch): (Vec<_>, Vec<R>) = chunk.into_iter().unzip();

        let results = match self.sink.upload(&batch).await {
            Ok(results) if results.len() == batch.len() => results,
            Ok(results) => {
                let reason = format!(
                    "sink returned {} results for {} records",
                    results.len(),
                    batch.len()
                );
                self.fail_all(managers, batch, reason, report).await;
                return;
            },
            Err(err) => {
                self.fail_all(managers, batch, format!("{:#}", err), report).await;
                return;
            },
        };

        for ((mut manager, record), result) in managers.into_iter().zip(batch).zip(results) {
            match result {
                UploadResult::Accepted(response) => match manager.succeeded().await {
                    Ok(()) => report.successes.push(response),
                    Err(err) => {
                        error!(
                            record_identifier = %manager.record_identifier(),
                            error = %err,
                            "Uploaded record could not be marked succeeded"
                        );
                        report.issues.push(Issue::new(record, err.into()));
                    },
                },
                UploadResult::Rejected(response) => match manager.failed().await {
                    Ok(()) => report.failures.push(response),
                    Err(err) => report.issues.push(Issue::new(record, err.into())),
                },
            }
        }
    }

    async fn fail_all<R: SinkRecord>(
        &self,
        managers: Vec<SinkRecordStateManager>,
        batch: Vec<R>,
        reason: String,
        report: &mut BatchReport<R>,
    ) {
        warn!(records = batch.len(), reason = %reason, "Sink call failed for the whole batch");

        for (mut manager, record) in managers.into_iter().zip(batch) {
            let kind = match manager.failed().await {
                Ok(()) => IssueKind::Sink(reason.clone()),
                Err(err) => IssueKind::Sink(format!("{}; could not mark failed: {}", reason, err)),
            };
            report.issues.push(Issue::new(record, kind));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::record::RecordKey;

    #[derive(Debug)]
    struct Rec(&'static str);

    impl SinkRecord for Rec {
        fn record_identifier(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(SinkBatchConfig::new("", 10).is_err());
        assert!(SinkBatchConfig::new("etl-A", 0).is_err());
        let config = SinkBatchConfig::new("etl-A", 10).unwrap();
        assert_eq!(config.destination_batch_size, 10);
    }

    #[test]
    fn test_issue_kind_from_state_error() {
        let err = StateError::IllegalTransition {
            key: RecordKey::new("etl-A", "x"),
            source: IllegalTransition {
                current: EtlState::Processing,
                proposed: EtlState::Processing,
            },
        };
        let kind = IssueKind::from(err);
        assert!(matches!(kind, IssueKind::IllegalTransition(t) if t.is_duplicate()));
    }

    #[test]
    fn test_store_errors_stay_typed_in_issues() {
        let conflict = StateError::Store(StoreError::Conflict {
            key: RecordKey::new("etl-A", "x"),
            expected: EtlState::Processing,
            proposed: EtlState::Succeeded,
            actual: Some(EtlState::Failed),
        });
        assert_eq!(
            IssueKind::from(conflict),
            IssueKind::Store(StoreIssue::Conflict {
                expected: EtlState::Processing,
                proposed: EtlState::Succeeded,
                actual: Some(EtlState::Failed),
            })
        );

        let outage = StateError::Store(StoreError::Unavailable("pool timed out".to_string()));
        let kind = IssueKind::from(outage);
        assert_eq!(
            kind,
            IssueKind::Store(StoreIssue::Unavailable("pool timed out".to_string()))
        );
        assert_eq!(kind.to_string(), "state store error: unavailable: pool timed out");
    }

    #[test]
    fn test_report_counts_and_merge() {
        let mut report: BatchReport<Rec> = BatchReport::default();
        report.successes.push(serde_json::json!({"ok": 1}));
        assert!(report.is_clean());

        let mut other = BatchReport::default();
        other.failures.push(serde_json::json!({"error": "invalid click id"}));
        other
            .issues
            .push(Issue::new(Rec("dup"), IssueKind::Sink("timeout".to_string())));

        report.merge(other);
        assert_eq!(report.submitted(), 3);
        assert!(!report.is_clean());
        assert_eq!(report.issues[0].record_identifier, "dup");
    }

    #[test]
    fn test_upload_result_serialization() {
        let json = serde_json::to_value(UploadResult::Rejected(serde_json::json!("bad"))).unwrap();
        assert_eq!(json, serde_json::json!({"outcome": "rejected", "response": "bad"}));
    }
}
