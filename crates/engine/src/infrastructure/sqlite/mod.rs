//! SQLite-backed adventure store.
//!
//! One [`SqliteStore`] implements every repository port. Writes that must be
//! serialised per adventure go through [`SqliteAdventureLock`], which takes
//! the database write lock with its first statement.

mod adventures;
mod cards;
mod graph;
mod history;
mod rows;
mod schema;

#[cfg(test)]
mod store_tests;

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::infrastructure::ports::{ClockPort, RepoError};

pub use adventures::SqliteAdventureLock;
pub use graph::SqliteGraphWriter;

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// SQLite implementation of the adventure, history, card and graph ports.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `path` and ensures the
    /// schema.
    pub async fn connect(path: &str, clock: Arc<dyn ClockPort>) -> Result<Self, RepoError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| RepoError::database("connect", e))?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{path}"))
            .map_err(|e| RepoError::database("connect", e))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .map_err(|e| RepoError::database("connect", e))?;

        schema::ensure_schema(&pool).await?;
        tracing::info!(path = %path, "SQLite store ready");

        Ok(Self { pool, clock })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
