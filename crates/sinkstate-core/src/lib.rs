//! SinkState Core Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Idempotent per-record state tracking for ETL sinks.
//!
//! # Overview
//!
//! ETLs that push records into an external, side-effecting API (ad platforms,
//! CRMs, webhooks) must not submit the same record twice, even across
//! retries and reruns. Each record gets one persisted row, keyed by
//! `(etl_signature, record_identifier)`, that moves through a strict
//! lifecycle:
//!
//! - **Ready**: created lazily on first reference
//! - **Processing**: claimed by a run, upload in flight
//! - **Succeeded**: terminal, never submitted again
//! - **Failed**: can be put back to `Ready` for another attempt
//!
//! ## Building Blocks
//!
//! - [`state`]: the transition table, pure logic
//! - [`store`]: the [`StateStore`] trait plus in-memory and PostgreSQL adapters
//! - [`manager`]: [`SinkRecordStateManager`], the per-record façade
//! - [`batch`]: [`SinkBatchProcessor`], verify/upload/mark for whole batches
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sinkstate_core::{InMemoryStateStore, SinkRecordStateManager, EtlState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(InMemoryStateStore::new());
//!     let mut record = SinkRecordStateManager::new(store, "gclid||purchase||2024-01-18", "offline-conversions").await?;
//!
//!     assert_eq!(record.current_state(), EtlState::Ready);
//!     record.processing().await?;
//!     // ... call the external API ...
//!     record.succeeded().await?;
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod db;
pub mod error;
pub mod manager;
pub mod record;
pub mod state;
pub mod store;

// Re-export commonly used types
pub use batch::{
    BatchReport, Issue, IssueKind, RecordSink, SinkBatchConfig, SinkBatchProcessor, SinkRecord,
    StoreIssue, UploadResult,
};
pub use error::{StateError, StateResult, StoreError};
pub use manager::SinkRecordStateManager;
pub use record::{EtlRecordState, RecordKey};
pub use state::{validate_transition, EtlState, IllegalTransition};
pub use store::{InMemoryStateStore, PgStateStore, StateStore};
