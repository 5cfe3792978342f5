//! `sinkstate mark` command implementation
//!
//! Operator override for a single record. Goes through the record manager,
//! so the transition table still applies.

use colored::Colorize;
use sinkstate_core::{EtlState, StateStore};
use std::sync::Arc;

use super::retry::transition_existing;
use crate::error::Result;
use crate::output::{colored_state, print_json};

pub async fn run(
    store: Arc<dyn StateStore>,
    etl_signature: &str,
    record_identifier: &str,
    state: EtlState,
    json: bool,
) -> Result<()> {
    let manager = transition_existing(store, etl_signature, record_identifier, state).await?;

    if json {
        return print_json(manager.record());
    }

    println!(
        "{} {} is now {}",
        "✓".green(),
        manager.key(),
        colored_state(manager.current_state())
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use sinkstate_core::{InMemoryStateStore, RecordKey, SinkRecordStateManager};

    #[tokio::test]
    async fn test_mark_follows_transition_table() {
        let store = Arc::new(InMemoryStateStore::new());
        SinkRecordStateManager::new(store.clone(), "rec-1", "etl-A")
            .await
            .unwrap();

        run(store.clone(), "etl-A", "rec-1", EtlState::Processing, true)
            .await
            .unwrap();
        run(store.clone(), "etl-A", "rec-1", EtlState::Succeeded, true)
            .await
            .unwrap();

        let err = run(store.clone(), "etl-A", "rec-1", EtlState::Ready, true)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Transition(_)));

        let row = store.get(&RecordKey::new("etl-A", "rec-1")).await.unwrap();
        assert_eq!(row.state, EtlState::Succeeded);
    }

    #[tokio::test]
    async fn test_mark_unknown_record_is_not_found() {
        let store = Arc::new(InMemoryStateStore::new());

        let err = run(store.clone(), "etl-A", "ghost", EtlState::Failed, true)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::NotFound(_)));
        assert!(store.is_empty().await);
    }
}
