//! SinkState CLI Library
//!
//! Operator tooling for the ETL sink record state table.
//!
//! # Overview
//!
//! - **Schema**: create or upgrade the state table (`sinkstate sync-table`)
//! - **Inspection**: look at one record or a whole ETL (`sinkstate show`, `sinkstate list`)
//! - **Recovery**: put failed records back in line (`sinkstate retry`)
//! - **Overrides**: move a record through the state machine by hand (`sinkstate mark`)

pub mod commands;
pub mod error;
pub mod output;

// Re-export commonly used types
pub use error::{CliError, Result};

use clap::{Parser, Subcommand};
use sinkstate_core::EtlState;

/// SinkState - per-record state tracking for ETL sinks
#[derive(Parser, Debug)]
#[command(name = "sinkstate")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// PostgreSQL connection string (overrides the configured one)
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    pub database_url: Option<String>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or upgrade the state table
    SyncTable,

    /// Show the state of one record
    Show {
        /// ETL signature the record belongs to
        etl_signature: String,

        /// Record identifier within the ETL
        record_identifier: String,
    },

    /// List the records of an ETL
    List {
        /// ETL signature
        etl_signature: String,

        /// Only show records in this state
        #[arg(short, long)]
        state: Option<EtlState>,
    },

    /// Put failed records back to ready
    Retry {
        /// ETL signature the records belong to
        etl_signature: String,

        /// Record identifiers to retry
        #[arg(required = true)]
        record_identifiers: Vec<String>,
    },

    /// Move one record to a new state (subject to the transition rules)
    Mark {
        /// ETL signature the record belongs to
        etl_signature: String,

        /// Record identifier within the ETL
        record_identifier: String,

        /// Target state: ready, processing, succeeded or failed
        state: EtlState,
    },
}
