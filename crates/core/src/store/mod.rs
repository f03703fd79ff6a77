//! SQLite-backed persistence: the sample series, calibration events and the
//! key-value config table.
//!
//! A [`Store`] is opened once per command, passed explicitly to whatever needs
//! it, and closed when the command finishes. Query functions in the submodules
//! take the pool directly.

pub mod calibration;
pub mod samples;
pub mod settings;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::error::AgentError;

const BUSY_TIMEOUT_SECS: u64 = 5;

/// Open handle to the battery database.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if needed) the database file at `path` and apply migrations.
    pub async fn open(path: &Path) -> Result<Self, AgentError> {
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS));
        Self::connect(opts).await
    }

    /// Private in-memory database. Lives as long as the store.
    pub async fn open_in_memory() -> Result<Self, AgentError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;
        Self::connect(opts).await
    }

    async fn connect(opts: SqliteConnectOptions) -> Result<Self, AgentError> {
        // Single connection: one writer per process, and an in-memory
        // database exists only on the connection that created it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;
        sqlx::migrate!("../../migrations").run(&pool).await?;
        tracing::debug!("store opened and migrations applied");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Flush and release the connection.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
