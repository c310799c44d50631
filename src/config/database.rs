use crate::core::{AppError, Result};
use serde::Deserialize;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Embedded schema migrations, applied at pool creation.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Queue admission bound: how long a request may wait for a connection.
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        Ok(DatabaseConfig {
            url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://tillpoint.db?mode=rwc".to_string()),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| {
                    AppError::Configuration("Invalid DATABASE_MAX_CONNECTIONS".to_string())
                })?,
            acquire_timeout_secs: env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| {
                    AppError::Configuration("Invalid DATABASE_ACQUIRE_TIMEOUT_SECS".to_string())
                })?,
        })
    }

    /// Configuration for an isolated in-memory database.
    ///
    /// A single connection keeps the in-memory store alive and serializes
    /// writers, which is exactly what per-test isolation needs.
    pub fn in_memory() -> Self {
        DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout_secs: 5,
        }
    }

    /// Create a SQLite connection pool and apply pending migrations.
    ///
    /// WAL journaling lets readers and writers proceed concurrently; foreign
    /// keys are on (SQLite defaults them off); a busy timeout covers brief
    /// write-lock contention between pooled connections.
    pub async fn create_pool(&self) -> Result<SqlitePool> {
        let options = SqliteConnectOptions::from_str(&self.url)
            .map_err(AppError::Database)?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .connect_with(options)
            .await
            .map_err(AppError::Database)?;

        MIGRATOR.run(&pool).await.map_err(|e| {
            AppError::Configuration(format!("Failed to run migrations: {}", e))
        })?;

        info!(
            max_connections = self.max_connections,
            "Database pool initialized"
        );

        Ok(pool)
    }
}
