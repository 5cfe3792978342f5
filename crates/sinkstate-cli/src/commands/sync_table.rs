//! `sinkstate sync-table` command implementation
//!
//! Creates the state table or applies pending migrations.

use colored::Colorize;
use serde_json::json;
use sinkstate_core::PgStateStore;

use crate::error::Result;
use crate::output::print_json;

pub async fn run(store: &PgStateStore, json: bool) -> Result<()> {
    store.health_check().await?;
    store.sync_table().await?;

    if json {
        print_json(&json!({ "table": "etl_sink_record_state", "status": "up_to_date" }))
    } else {
        println!("{} State table is up to date", "✓".green());
        Ok(())
    }
}
