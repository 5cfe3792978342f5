//! Human and JSON rendering of state rows

use colored::{ColoredString, Colorize};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use serde::Serialize;
use sinkstate_core::{EtlRecordState, EtlState};

use crate::error::Result;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

pub fn colored_state(state: EtlState) -> ColoredString {
    match state {
        EtlState::Ready => state.as_str().cyan(),
        EtlState::Processing => state.as_str().yellow(),
        EtlState::Succeeded => state.as_str().green(),
        EtlState::Failed => state.as_str().red(),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Key/value table for a single row
pub fn record_table(record: &EtlRecordState) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);

    table.add_row(vec!["ETL signature", &record.etl_signature]);
    table.add_row(vec!["Record", &record.record_identifier]);
    table.add_row(vec!["State", record.state.as_str()]);
    table.add_row(vec![
        "Created".to_string(),
        record.created_at.format(TIME_FORMAT).to_string(),
    ]);
    table.add_row(vec![
        "Updated".to_string(),
        record.updated_at.format(TIME_FORMAT).to_string(),
    ]);

    table
}

/// One line per row
pub fn records_table(records: &[EtlRecordState]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Record", "State", "Created", "Updated"]);

    for record in records {
        table.add_row(vec![
            record.record_identifier.clone(),
            record.state.to_string(),
            record.created_at.format(TIME_FORMAT).to_string(),
            record.updated_at.format(TIME_FORMAT).to_string(),
        ]);
    }

    table
}
