//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function. Commands other
//! than `sync-table` only need a [`StateStore`](sinkstate_core::StateStore),
//! so they can be exercised against the in-memory store.

pub mod list;
pub mod mark;
pub mod retry;
pub mod show;
pub mod sync_table;

use sinkstate_core::config::Config;
use sinkstate_core::PgStateStore;
use tracing::debug;

use crate::error::{CliError, Result};

/// Open the PostgreSQL state store from configuration
///
/// An explicit `--database-url` wins over `DATABASE_URL` from the environment
/// or `.env`.
pub async fn connect(database_url: Option<&str>) -> Result<PgStateStore> {
    let mut config = Config::load().map_err(|e| CliError::config(format!("{:#}", e)))?;
    if let Some(url) = database_url {
        config.database.url = url.to_string();
    }
    config
        .validate()
        .map_err(|e| CliError::config(format!("{:#}", e)))?;

    debug!(max_connections = config.database.max_connections, "Connecting to state store");
    Ok(PgStateStore::connect(&config.database).await?)
}
