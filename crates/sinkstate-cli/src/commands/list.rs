//! `sinkstate list` command implementation

use colored::Colorize;
use sinkstate_core::{EtlRecordState, EtlState, StateStore};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::output::{colored_state, print_json, records_table};

/// Row count per state
pub fn count_by_state(records: &[EtlRecordState]) -> BTreeMap<&'static str, usize> {
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.state.as_str()).or_default() += 1;
    }
    counts
}

pub async fn run(
    store: &dyn StateStore,
    etl_signature: &str,
    state: Option<EtlState>,
    json: bool,
) -> Result<()> {
    let records = store.list(etl_signature, state).await?;

    if json {
        return print_json(&records);
    }

    if records.is_empty() {
        println!("No records found for ETL '{}'.", etl_signature);
        return Ok(());
    }

    println!("{}", records_table(&records));
    println!();
    println!("{}", "Summary:".cyan().bold());
    let counts = count_by_state(&records);
    for state in EtlState::ALL {
        if let Some(count) = counts.get(state.as_str()) {
            println!("  {:<12} {}", colored_state(state), count);
        }
    }
    println!("  {:<12} {}", "total", records.len());

    Ok(())
}
