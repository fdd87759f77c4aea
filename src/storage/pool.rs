//! # SQLite Pool
//!
//! One pool per process. Every connection enforces foreign keys, waits on a busy
//! database instead of failing immediately and (for file databases) uses WAL so
//! readers do not block the refresh-token writer.

use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite,
};

use crate::config::DatabaseConfig;
use crate::errors::{Error, Result};

/// Type alias for the database connection pool
pub type DbPool = Pool<Sqlite>;

const SQLITE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the pool described by `config`, applying migrations when `auto_migrate` is set
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    check_bounds(config)?;
    let options = connect_options(config)?;

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout())
        .test_before_acquire(true);
    if let Some(idle_timeout) = config.idle_timeout() {
        pool_options = pool_options.idle_timeout(idle_timeout);
    }

    let pool = pool_options.connect_with(options).await.map_err(|e| {
        tracing::error!(error = %e, url = %config.url, "Failed to open SQLite pool");
        Error::database(e, format!("Failed to open database '{}'", config.url))
    })?;

    tracing::info!(
        url = %config.url,
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database pool ready"
    );

    if config.auto_migrate {
        crate::storage::run_migrations(&pool).await?;
    }

    Ok(pool)
}

fn connect_options(config: &DatabaseConfig) -> Result<SqliteConnectOptions> {
    let options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| Error::database(e, format!("Invalid SQLite URL '{}'", config.url)))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(SQLITE_BUSY_TIMEOUT);

    // In-memory databases only support the memory journal
    if config.url.contains(":memory:") {
        Ok(options)
    } else {
        Ok(options.journal_mode(SqliteJournalMode::Wal))
    }
}

fn check_bounds(config: &DatabaseConfig) -> Result<()> {
    if !config.is_sqlite() {
        return Err(Error::config(format!("Unsupported database URL '{}', expected sqlite:", config.url)));
    }
    if config.max_connections == 0 || config.min_connections > config.max_connections {
        return Err(Error::config(format!(
            "Invalid pool bounds: min {} / max {}",
            config.min_connections, config.max_connections
        )));
    }
    Ok(())
}

/// Connection counts reported by the health check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub size: u32,
    pub idle: usize,
}

impl PoolStats {
    pub fn in_use(&self) -> u32 {
        self.size.saturating_sub(u32::try_from(self.idle).unwrap_or(u32::MAX))
    }
}

pub fn get_pool_stats(pool: &DbPool) -> PoolStats {
    PoolStats { size: pool.size(), idle: pool.num_idle() }
}
