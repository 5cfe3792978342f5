//! Configuration management

use serde::{Deserialize, Serialize};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/sinkstate";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 1;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default number of records sent to the destination in one call.
pub const DEFAULT_DESTINATION_BATCH_SIZE: usize = 2000;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub etl: EtlConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// Settings of the ETL that drives the sink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlConfig {
    /// Identifies the pipeline in the state table; empty until set
    pub etl_signature: String,
    pub destination_batch_size: usize,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from `.env`, the environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS),
                min_connections: env_or("DATABASE_MIN_CONNECTIONS", DEFAULT_DATABASE_MIN_CONNECTIONS),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_or("DATABASE_IDLE_TIMEOUT", DEFAULT_DATABASE_IDLE_TIMEOUT_SECS),
            },
            etl: EtlConfig {
                etl_signature: std::env::var("ETL_SIGNATURE").unwrap_or_default(),
                destination_batch_size: env_or(
                    "ETL_DESTINATION_BATCH_SIZE",
                    DEFAULT_DESTINATION_BATCH_SIZE,
                ),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.etl.destination_batch_size == 0 {
            anyhow::bail!("ETL destination_batch_size must be greater than 0");
        }

        if self.etl.etl_signature.is_empty() {
            tracing::debug!("ETL_SIGNATURE not set - batch processing needs an explicit signature");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            etl: EtlConfig {
                etl_signature: String::new(),
                destination_batch_size: DEFAULT_DESTINATION_BATCH_SIZE,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 4] = [
        "DATABASE_URL",
        "DATABASE_MAX_CONNECTIONS",
        "ETL_SIGNATURE",
        "ETL_DESTINATION_BATCH_SIZE",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.etl.destination_batch_size, DEFAULT_DESTINATION_BATCH_SIZE);
    }

    #[test]
    #[serial]
    fn test_load_reads_environment() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgresql://localhost/etl_test");
        std::env::set_var("DATABASE_MAX_CONNECTIONS", "4");
        std::env::set_var("ETL_SIGNATURE", "offline-conversions");
        std::env::set_var("ETL_DESTINATION_BATCH_SIZE", "50");

        let config = Config::load().unwrap();
        assert_eq!(config.database.url, "postgresql://localhost/etl_test");
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.etl.etl_signature, "offline-conversions");
        assert_eq!(config.etl.destination_batch_size, 50);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparseable_values_fall_back_to_defaults() {
        clear_env();
        std::env::set_var("DATABASE_MAX_CONNECTIONS", "lots");

        let config = Config::load().unwrap();
        assert_eq!(config.database.max_connections, DEFAULT_DATABASE_MAX_CONNECTIONS);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_zero_batch_size_is_rejected() {
        clear_env();
        std::env::set_var("ETL_DESTINATION_BATCH_SIZE", "0");

        let err = Config::load().unwrap_err();
        assert!(err.to_string().contains("destination_batch_size"));

        clear_env();
    }

    #[test]
    fn test_min_connections_above_max_is_rejected() {
        let mut config = Config::default();
        config.database.min_connections = 20;
        assert!(config.validate().is_err());
    }
}
