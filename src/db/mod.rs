mod migrations;
mod models;
mod queries;
mod seed;

pub use models::*;
pub use queries::*;
pub use seed::{default_home_sections, seed_defaults, upsert_admin};

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, Transaction};
use tracing::info;

/// Pool size. SQLite serializes writers, so a few readers are enough.
const MAX_CONNECTIONS: u32 = 5;
/// How long a writer waits for the lock before reporting SQLITE_BUSY.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Open a transaction that takes the write lock up front. Use it for every
/// read-then-write: under WAL a deferred transaction that upgrades late fails
/// with SQLITE_BUSY_SNAPSHOT instead of waiting.
pub async fn begin_write(pool: &SqlitePool) -> sqlx::Result<Transaction<'static, Sqlite>> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

/// Essays, accounts, revisions and moderation history in one SQLite file.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database at `path` and bring the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, a migration fails, or
    /// the file turns out to be read-only.
    pub async fn new(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // Revisions, likes and moderation actions must point at a real post.
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open essay database at {}", path.display()))?;

        migrations::run(&pool).await?;
        info!(path = %path.display(), "Essay database ready");

        let db = Self { pool };
        db.verify_writable(path).await?;
        Ok(db)
    }

    /// Take the write lock once so a read-only volume fails at startup
    /// instead of on the first saved draft.
    async fn verify_writable(&self, path: &Path) -> Result<()> {
        let tx = begin_write(&self.pool).await.with_context(|| {
            format!(
                "Essay database is not writable (path: {}). Check volume permissions",
                path.display()
            )
        })?;
        tx.rollback()
            .await
            .context("Failed to release the writability check")?;
        Ok(())
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
