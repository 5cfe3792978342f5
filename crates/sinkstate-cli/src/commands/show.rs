//! `sinkstate show` command implementation
//!
//! Prints one record's row. Never creates the row.

use sinkstate_core::{EtlRecordState, RecordKey, StateStore};

use crate::error::Result;
use crate::output::{colored_state, print_json, record_table};

pub async fn fetch(
    store: &dyn StateStore,
    etl_signature: &str,
    record_identifier: &str,
) -> Result<EtlRecordState> {
    let key = RecordKey::new(etl_signature, record_identifier);
    Ok(store.get(&key).await?)
}

pub async fn run(
    store: &dyn StateStore,
    etl_signature: &str,
    record_identifier: &str,
    json: bool,
) -> Result<()> {
    let record = fetch(store, etl_signature, record_identifier).await?;

    if json {
        return print_json(&record);
    }

    println!("{}", record_table(&record));
    println!("State: {}", colored_state(record.state));
    Ok(())
}
