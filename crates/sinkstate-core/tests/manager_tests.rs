//! Record lifecycle tests against the in-memory store

use sinkstate_core::{
    EtlState, InMemoryStateStore, SinkRecordStateManager, StateError, StateStore, StoreError,
};
use std::sync::Arc;

const ETL: &str = "etl-A";

fn store() -> Arc<InMemoryStateStore> {
    Arc::new(InMemoryStateStore::new())
}

#[tokio::test]
async fn test_fresh_record_runs_to_success() {
    let store = store();
    let mut record = SinkRecordStateManager::new(store.clone(), "rec-1", ETL)
        .await
        .unwrap();

    assert_eq!(record.current_state(), EtlState::Ready);
    record.processing().await.unwrap();
    assert_eq!(record.current_state(), EtlState::Processing);
    record.succeeded().await.unwrap();
    assert_eq!(record.current_state(), EtlState::Succeeded);

    let row = store.get(record.key()).await.unwrap();
    assert_eq!(row.state, EtlState::Succeeded);
    assert!(row.updated_at >= row.created_at);
}

#[tokio::test]
async fn test_failed_record_can_be_retried() {
    let store = store();
    let mut record = SinkRecordStateManager::new(store.clone(), "rec-3", ETL)
        .await
        .unwrap();

    record.processing().await.unwrap();
    record.failed().await.unwrap();
    record.ready().await.unwrap();
    assert_eq!(record.current_state(), EtlState::Ready);
    record.processing().await.unwrap();
    assert_eq!(record.current_state(), EtlState::Processing);
}

#[tokio::test]
async fn test_ready_to_failed_is_rejected_without_write() {
    let store = store();
    let mut record = SinkRecordStateManager::new(store.clone(), "rec-2", ETL)
        .await
        .unwrap();
    let before = store.get(record.key()).await.unwrap();

    let err = record.failed().await.unwrap_err();
    let transition = err.illegal_transition().expect("illegal transition");
    assert_eq!(transition.current, EtlState::Ready);
    assert_eq!(transition.proposed, EtlState::Failed);

    assert_eq!(record.current_state(), EtlState::Ready);
    assert_eq!(store.get(record.key()).await.unwrap(), before);
}

#[tokio::test]
async fn test_duplicate_processing_is_rejected() {
    let store = store();
    let mut record = SinkRecordStateManager::new(store.clone(), "rec-dup", ETL)
        .await
        .unwrap();
    record.processing().await.unwrap();

    let err = record.processing().await.unwrap_err();
    assert!(err.illegal_transition().map(|t| t.is_duplicate()).unwrap_or(false));
    assert_eq!(record.current_state(), EtlState::Processing);
}

#[tokio::test]
async fn test_succeeded_is_absorbing() {
    let store = store();
    let mut record = SinkRecordStateManager::new(store.clone(), "rec-done", ETL)
        .await
        .unwrap();
    record.processing().await.unwrap();
    record.succeeded().await.unwrap();

    assert!(record.ready().await.unwrap_err().is_illegal_transition());
    assert!(record.processing().await.unwrap_err().is_illegal_transition());
    assert!(record.failed().await.unwrap_err().is_illegal_transition());
    assert!(record.succeeded().await.unwrap_err().is_illegal_transition());

    let reopened = SinkRecordStateManager::new(store.clone(), "rec-done", ETL)
        .await
        .unwrap();
    assert_eq!(reopened.current_state(), EtlState::Succeeded);
}

#[tokio::test]
async fn test_same_identifier_under_other_signature_is_independent() {
    let store = store();
    let mut a = SinkRecordStateManager::new(store.clone(), "rec-1", "etl-A")
        .await
        .unwrap();
    a.processing().await.unwrap();

    let b = SinkRecordStateManager::new(store.clone(), "rec-1", "etl-B")
        .await
        .unwrap();
    assert_eq!(b.current_state(), EtlState::Ready);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn test_concurrent_construction_creates_one_row() {
    let store = store();

    let (first, second) = tokio::join!(
        SinkRecordStateManager::new(store.clone(), "rec-race", ETL),
        SinkRecordStateManager::new(store.clone(), "rec-race", ETL),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(store.len().await, 1);
    assert_eq!(first.record().created_at, second.record().created_at);
    assert_eq!(first.current_state(), EtlState::Ready);
    assert_eq!(second.current_state(), EtlState::Ready);
}

#[tokio::test]
async fn test_concurrent_claim_has_one_winner() {
    let store = store();
    let mut first = SinkRecordStateManager::new(store.clone(), "rec-claim", ETL)
        .await
        .unwrap();
    let mut second = SinkRecordStateManager::new(store.clone(), "rec-claim", ETL)
        .await
        .unwrap();

    let (a, b) = tokio::join!(first.processing(), second.processing());

    let (winner, loser) = match (a, b) {
        (Ok(()), Err(err)) => (&first, err),
        (Err(err), Ok(())) => (&second, err),
        other => panic!("expected exactly one winner, got {:?}", other),
    };

    assert_eq!(winner.current_state(), EtlState::Processing);
    assert!(loser.is_conflict());
    assert!(matches!(
        loser,
        StateError::Store(StoreError::Conflict {
            expected: EtlState::Ready,
            proposed: EtlState::Processing,
            actual: Some(EtlState::Processing),
            ..
        })
    ));
}

#[tokio::test]
async fn test_lost_race_names_the_attempted_state() {
    let store = store();
    let mut uploader = SinkRecordStateManager::new(store.clone(), "rec-finish", ETL)
        .await
        .unwrap();
    uploader.processing().await.unwrap();

    let mut watchdog = SinkRecordStateManager::new(store.clone(), "rec-finish", ETL)
        .await
        .unwrap();
    assert_eq!(watchdog.current_state(), EtlState::Processing);

    uploader.succeeded().await.unwrap();
    let err = watchdog.failed().await.unwrap_err();

    assert!(matches!(
        err,
        StateError::Store(StoreError::Conflict {
            expected: EtlState::Processing,
            proposed: EtlState::Failed,
            actual: Some(EtlState::Succeeded),
            ..
        })
    ));
    assert!(err.to_string().contains("to 'failed'"));
}

#[tokio::test]
async fn test_stale_manager_cannot_overwrite() {
    let store = store();
    let mut stale = SinkRecordStateManager::new(store.clone(), "rec-stale", ETL)
        .await
        .unwrap();
    let mut live = SinkRecordStateManager::new(store.clone(), "rec-stale", ETL)
        .await
        .unwrap();

    live.processing().await.unwrap();
    live.succeeded().await.unwrap();

    // Cache still says Ready, the store says Succeeded
    assert_eq!(stale.current_state(), EtlState::Ready);
    assert!(stale.processing().await.unwrap_err().is_conflict());

    assert_eq!(stale.refresh().await.unwrap(), EtlState::Succeeded);
    assert!(stale.processing().await.unwrap_err().is_illegal_transition());
}

#[tokio::test]
async fn test_list_filters_by_state() {
    let store = store();
    for id in ["a", "b", "c"] {
        SinkRecordStateManager::new(store.clone(), id, ETL)
            .await
            .unwrap();
    }
    let mut b = SinkRecordStateManager::new(store.clone(), "b", ETL)
        .await
        .unwrap();
    b.processing().await.unwrap();

    let all = store.list(ETL, None).await.unwrap();
    assert_eq!(all.len(), 3);

    let processing = store.list(ETL, Some(EtlState::Processing)).await.unwrap();
    assert_eq!(processing.len(), 1);
    assert_eq!(processing[0].record_identifier, "b");

    assert!(store.list("etl-other", None).await.unwrap().is_empty());
}
