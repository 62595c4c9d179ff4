// SQLite Connection Pool Setup

use crate::error::map_sqlx_error;
use jobledger_core::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Pool tuning knobs
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub busy_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Create SQLite connection pool with WAL mode and foreign keys enabled.
///
/// In-memory databases are pinned to a single connection that never expires,
/// since every SQLite connection would otherwise see its own empty database.
pub async fn create_pool(database_url: &str, config: &PoolConfig) -> Result<SqlitePool> {
    let in_memory = database_url.contains(":memory:");

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(map_sqlx_error)?
        .journal_mode(if in_memory {
            SqliteJournalMode::Memory
        } else {
            SqliteJournalMode::Wal
        })
        .busy_timeout(config.busy_timeout)
        .foreign_keys(true)
        .create_if_missing(true);

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(config.max_connections)
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(map_sqlx_error)?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_pool() {
        let pool = create_pool("sqlite::memory:", &PoolConfig::default())
            .await
            .unwrap();
        assert!(pool.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_create_pool_fails_for_missing_directory() {
        let result = create_pool(
            "/nonexistent-jobledger-dir/sub/records.db",
            &PoolConfig::default(),
        )
        .await;
        assert!(result.is_err());
    }
}
