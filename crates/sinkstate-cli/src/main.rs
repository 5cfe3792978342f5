//! SinkState CLI - Main entry point

use clap::Parser;
use sinkstate_cli::{commands, Cli, Commands};
use sinkstate_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use std::sync::Arc;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Verbose mode logs debug to the console, otherwise warnings only
    let log_config = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        })
        .output(LogOutput::Console)
        .log_file_prefix("sinkstate-cli")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging
    let _guard = init_logging(&log_config).ok().flatten();

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn execute_command(cli: &Cli) -> sinkstate_cli::Result<()> {
    let store = commands::connect(cli.database_url.as_deref()).await?;

    match &cli.command {
        Commands::SyncTable => commands::sync_table::run(&store, cli.json).await,

        Commands::Show {
            etl_signature,
            record_identifier,
        } => commands::show::run(&store, etl_signature, record_identifier, cli.json).await,

        Commands::List {
            etl_signature,
            state,
        } => commands::list::run(&store, etl_signature, *state, cli.json).await,

        Commands::Retry {
            etl_signature,
            record_identifiers,
        } => {
            commands::retry::run(Arc::new(store), etl_signature, record_identifiers, cli.json)
                .await
        },

        Commands::Mark {
            etl_signature,
            record_identifier,
            state,
        } => {
            commands::mark::run(
                Arc::new(store),
                etl_signature,
                record_identifier,
                *state,
                cli.json,
            )
            .await
        },
    }
}
