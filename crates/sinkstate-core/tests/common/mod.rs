//! Shared helpers for sinkstate-core integration tests
//!
//! PostgreSQL tests start a throwaway container through testcontainers and
//! apply the state table migration, so no local database is needed. They are
//! `#[ignore]`d by default because they require Docker:
//!
//! ```bash
//! cargo test -p sinkstate-core --test postgres_store_tests -- --ignored
//! ```

#![allow(dead_code)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use sinkstate_common::record_signature;
use sinkstate_core::{PgStateStore, RecordSink, SinkRecord, UploadResult};
use sqlx::postgres::PgPoolOptions;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tracing::{debug, info};

// ============================================================================
// PostgreSQL Test Container
// ============================================================================

/// PostgreSQL container with the state table migrated
pub struct TestPostgres {
    _container: ContainerAsync<Postgres>,
    store: PgStateStore,
    connection_string: String,
}

impl TestPostgres {
    pub async fn start() -> Result<Self> {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .with_tag("16-alpine")
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let connection_string =
            format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);
        debug!("PostgreSQL connection: {}", connection_string);

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&connection_string)
            .await
            .context("Failed to connect to PostgreSQL")?;

        let store = PgStateStore::new(Arc::new(pool));
        store
            .sync_table()
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            _container: container,
            store,
            connection_string,
        })
    }

    pub fn store(&self) -> PgStateStore {
        self.store.clone()
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

// ============================================================================
// Test Records and Sinks
// ============================================================================

/// Offline conversion row, keyed by click id + conversion name + time
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub click_id: String,
    pub conversion_name: String,
    pub conversion_time: String,
}

impl Conversion {
    pub fn new(click_id: &str) -> Self {
        Self {
            click_id: click_id.to_string(),
            conversion_name: "purchase".to_string(),
            conversion_time: "2024-01-18 10:00:00".to_string(),
        }
    }
}

impl SinkRecord for Conversion {
    fn record_identifier(&self) -> String {
        record_signature(&[
            self.click_id.as_str(),
            self.conversion_name.as_str(),
            self.conversion_time.as_str(),
        ])
        .expect("conversion fields form a valid signature")
    }
}

/// Scriptable in-process sink that remembers every batch it was given
#[derive(Default)]
pub struct MockSink {
    rejected: HashSet<String>,
    fail_calls: bool,
    drop_results: bool,
    batches: Mutex<Vec<Vec<String>>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject records with this click id
    pub fn rejecting(mut self, click_id: &str) -> Self {
        self.rejected.insert(click_id.to_string());
        self
    }

    /// Fail every upload call
    pub fn failing(mut self) -> Self {
        self.fail_calls = true;
        self
    }

    /// Return one result fewer than the batch size
    pub fn short_results(mut self) -> Self {
        self.drop_results = true;
        self
    }

    /// Click ids of each uploaded batch, in call order
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().map(|b| b.clone()).unwrap_or_default()
    }

    /// Every click id ever uploaded
    pub fn uploaded(&self) -> Vec<String> {
        self.batches().into_iter().flatten().collect()
    }
}

#[async_trait]
impl RecordSink<Conversion> for MockSink {
    async fn upload(&self, batch: &[Conversion]) -> anyhow::Result<Vec<UploadResult>> {
        if let Ok(mut batches) = self.batches.lock() {
            batches.push(batch.iter().map(|c| c.click_id.clone()).collect());
        }

        if self.fail_calls {
            anyhow::bail!("destination unavailable");
        }

        let mut results: Vec<UploadResult> = batch
            .iter()
            .map(|c| {
                if self.rejected.contains(&c.click_id) {
                    UploadResult::Rejected(json!({"gclid": c.click_id, "error": "INVALID_CLICK_ID"}))
                } else {
                    UploadResult::Accepted(json!({"gclid": c.click_id}))
                }
            })
            .collect();

        if self.drop_results {
            results.pop();
        }

        Ok(results)
    }
}

/// Unique ETL signature so tests sharing a database never collide
pub fn unique_signature(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}
