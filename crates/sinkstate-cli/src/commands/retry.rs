//! `sinkstate retry` command implementation
//!
//! Moves failed records back to `ready` so the next ETL run picks them up.
//! Each record is handled independently; one bad identifier does not stop
//! the others.

use colored::Colorize;
use serde::Serialize;
use sinkstate_core::{EtlState, RecordKey, SinkRecordStateManager, StateStore};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{CliError, Result};
use crate::output::print_json;

#[derive(Debug, Serialize)]
pub struct RetryOutcome {
    pub record_identifier: String,
    pub state: Option<EtlState>,
    pub error: Option<String>,
}

impl RetryOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Bind to an existing record through its manager and apply `state`
pub(crate) async fn transition_existing(
    store: Arc<dyn StateStore>,
    etl_signature: &str,
    record_identifier: &str,
    state: EtlState,
) -> Result<SinkRecordStateManager> {
    // The manager creates missing rows, operators must not
    store
        .get(&RecordKey::new(etl_signature, record_identifier))
        .await?;

    let mut manager = SinkRecordStateManager::new(store, record_identifier, etl_signature).await?;
    manager.change_state(state).await?;
    Ok(manager)
}

pub async fn retry_all(
    store: Arc<dyn StateStore>,
    etl_signature: &str,
    record_identifiers: &[String],
) -> Vec<RetryOutcome> {
    let mut outcomes = Vec::with_capacity(record_identifiers.len());

    for record_identifier in record_identifiers {
        let outcome = match transition_existing(
            store.clone(),
            etl_signature,
            record_identifier,
            EtlState::Ready,
        )
        .await
        {
            Ok(manager) => {
                info!(etl_signature, record_identifier = %record_identifier, "Record reset to ready");
                RetryOutcome {
                    record_identifier: record_identifier.clone(),
                    state: Some(manager.current_state()),
                    error: None,
                }
            },
            Err(err) => {
                warn!(etl_signature, record_identifier = %record_identifier, error = %err, "Retry failed");
                RetryOutcome {
                    record_identifier: record_identifier.clone(),
                    state: None,
                    error: Some(err.to_string()),
                }
            },
        };
        outcomes.push(outcome);
    }

    outcomes
}

pub async fn run(
    store: Arc<dyn StateStore>,
    etl_signature: &str,
    record_identifiers: &[String],
    json: bool,
) -> Result<()> {
    let outcomes = retry_all(store, etl_signature, record_identifiers).await;
    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();

    if json {
        print_json(&outcomes)?;
    } else {
        for outcome in &outcomes {
            match &outcome.error {
                None => println!("{} {} -> ready", "✓".green(), outcome.record_identifier),
                Some(error) => println!("{} {}: {}", "✗".red(), outcome.record_identifier, error),
            }
        }
    }

    if failed > 0 {
        return Err(CliError::PartialFailure {
            failed,
            total: outcomes.len(),
        });
    }

    Ok(())
}
