//! PostgreSQL-backed state store
//!
//! Create-if-absent is `INSERT ... ON CONFLICT DO NOTHING RETURNING`, and the
//! transition write is a single `UPDATE ... WHERE state = $expected`, so the
//! database resolves both creation and transition races.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::StateStore;
use crate::config::DatabaseConfig;
use crate::db::{create_pool, health_check, map_migrate_error, map_sqlx_error};
use crate::error::StoreError;
use crate::record::{EtlRecordState, RecordKey};
use crate::state::EtlState;

const RETURNING_COLUMNS: &str = "etl_signature, record_identifier, state, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct StateRow {
    etl_signature: String,
    record_identifier: String,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StateRow {
    fn into_record(self) -> Result<EtlRecordState, StoreError> {
        let state = self.state.parse::<EtlState>().map_err(|e| StoreError::CorruptRow {
            key: RecordKey::new(&self.etl_signature, &self.record_identifier),
            reason: e.to_string(),
        })?;

        Ok(EtlRecordState {
            etl_signature: self.etl_signature,
            record_identifier: self.record_identifier,
            state,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// State store over the `etl_sink_record_state` table
#[derive(Clone)]
pub struct PgStateStore {
    pool: Arc<PgPool>,
}

impl PgStateStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Open a pool from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = create_pool(config).await?;
        Ok(Self::new(Arc::new(pool)))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create or upgrade the state table
    pub async fn sync_table(&self) -> Result<(), StoreError> {
        sqlx::migrate!("../../migrations")
            .run(&*self.pool)
            .await
            .map_err(map_migrate_error)?;
        tracing::info!("ETL sink record state table is up to date");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        health_check(&self.pool).await
    }
}

#[async_trait]
impl StateStore for PgStateStore {
    #[instrument(skip_all, fields(key = %key))]
    async fn create_if_absent(&self, key: &RecordKey) -> Result<EtlRecordState, StoreError> {
        let inserted: Option<StateRow> = sqlx::query_as(&format!(
            r#"
            INSERT INTO etl_sink_record_state (etl_signature, record_identifier, state)
            VALUES ($1, $2, $3)
            ON CONFLICT (etl_signature, record_identifier) DO NOTHING
            RETURNING {}
            "#,
            RETURNING_COLUMNS
        ))
        .bind(&key.etl_signature)
        .bind(&key.record_identifier)
        .bind(EtlState::Ready.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match inserted {
            Some(row) => row.into_record(),
            None => {
                debug!("Row already exists");
                Err(StoreError::AlreadyExists(key.clone()))
            },
        }
    }

    #[instrument(skip_all, fields(key = %key))]
    async fn get(&self, key: &RecordKey) -> Result<EtlRecordState, StoreError> {
        let row: Option<StateRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM etl_sink_record_state
            WHERE etl_signature = $1 AND record_identifier = $2
            "#,
            RETURNING_COLUMNS
        ))
        .bind(&key.etl_signature)
        .bind(&key.record_identifier)
        .fetch_optional(&*self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.ok_or_else(|| StoreError::NotFound(key.clone()))?
            .into_record()
    }

    #[instrument(skip_all, fields(key = %key, from = %expected, to = %new_state))]
    async fn update(
        &self,
        key: &RecordKey,
        new_state: EtlState,
        expected: EtlState,
    ) -> Result<EtlRecordState, StoreError> {
        let updated: Option<StateRow> = sqlx::query_as(&format!(
            r#"
            UPDATE etl_sink_record_state
            SET state = $3, updated_at = NOW()
            WHERE etl_signature = $1 AND record_identifier = $2 AND state = $4
            RETURNING {}
            "#,
            RETURNING_COLUMNS
        ))
        .bind(&key.etl_signature)
        .bind(&key.record_identifier)
        .bind(new_state.as_str())
        .bind(expected.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if let Some(row) = updated {
            return row.into_record();
        }

        // Nothing matched: tell a lost race apart from a missing row
        let current = self.get(key).await?;
        debug!(actual = %current.state, "Compare-and-swap lost");
        Err(StoreError::Conflict {
            key: key.clone(),
            expected,
            proposed: new_state,
            actual: Some(current.state),
        })
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        etl_signature: &str,
        state: Option<EtlState>,
    ) -> Result<Vec<EtlRecordState>, StoreError> {
        let rows: Vec<StateRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM etl_sink_record_state
            WHERE etl_signature = $1 AND ($2::TEXT IS NULL OR state = $2)
            ORDER BY updated_at, record_identifier
            "#,
            RETURNING_COLUMNS
        ))
        .bind(etl_signature)
        .bind(state.map(|s| s.as_str()))
        .fetch_all(&*self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(StateRow::into_record).collect()
    }
}
