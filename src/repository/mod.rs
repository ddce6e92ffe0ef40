//! Repository layer for database operations

pub mod accounts;
pub mod authors;
pub mod books;
pub mod categories;
pub mod schema;

use std::{
    ops::{Deref, DerefMut},
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite, SqliteConnection, Transaction,
};
use tokio::sync::{Mutex, MutexGuard};

use crate::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
};

/// Main repository struct holding the database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Sqlite>,
    /// Held for the whole of every write transaction
    write_lock: Arc<Mutex<()>>,
}

/// Open write transaction; other writers wait until it is dropped
pub(crate) struct WriteTx<'a> {
    tx: Transaction<'static, Sqlite>,
    _guard: MutexGuard<'a, ()>,
}

impl WriteTx<'_> {
    pub async fn commit(self) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

impl Deref for WriteTx<'_> {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.tx
    }
}

impl DerefMut for WriteTx<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.tx
    }
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Start a write transaction.
    ///
    /// SQLite allows one writer at a time and a deferred transaction that
    /// read first cannot wait for the lock, so writers queue here instead.
    pub(crate) async fn begin_write(&self) -> AppResult<WriteTx<'_>> {
        let guard = self.write_lock.lock().await;
        let tx = self.pool.begin().await?;
        Ok(WriteTx { tx, _guard: guard })
    }

    /// Open a pool for the configured database, creating the file if needed
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .foreign_keys(true);

        // Connections are never recycled so `sqlite::memory:` keeps its data
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self::new(pool))
    }

    /// Create missing tables
    pub async fn init_schema(&self) -> AppResult<()> {
        for statement in schema::SCHEMA {
            sqlx::query(*statement).execute(&self.pool).await?;
        }
        tracing::debug!("Schema ready ({} statements)", schema::SCHEMA.len());
        Ok(())
    }

    /// Report a unique-key violation as a conflict, anything else as a database error
    pub(crate) fn unique_violation(err: sqlx::Error, message: impl Into<String>) -> AppError {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(message.into()),
            _ => AppError::Database(err),
        }
    }

    /// Round-trip to the database
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// In-memory repository with schema, for tests
#[cfg(test)]
pub(crate) async fn test_repository() -> Repository {
    // One connection: every new `:memory:` connection is a separate database
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        busy_timeout_ms: 5000,
    };
    let repository = Repository::connect(&config).await.unwrap();
    repository.init_schema().await.unwrap();
    repository
}

/// File-backed repository with the default pool size, for tests that need
/// several connections
#[cfg(test)]
pub(crate) async fn file_repository(dir: &tempfile::TempDir) -> Repository {
    let config = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("livros.db").display()),
        ..DatabaseConfig::default()
    };
    let repository = Repository::connect(&config).await.unwrap();
    repository.init_schema().await.unwrap();
    repository
}
