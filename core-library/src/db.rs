//! # Database Connection Pool Module
//!
//! SQLite connection pooling for the track store.
//!
//! ## Features
//!
//! - **WAL Mode** for file databases (multiple readers, one writer)
//! - **Foreign Keys** enforced so blobs cannot outlive their track
//! - **Schema bootstrap** on initialization
//! - **Health Check** before the pool is handed out
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_library::db::{create_pool, DatabaseConfig};
//!
//! let config = DatabaseConfig::new("vibestream.db").storage_quota_bytes(512 * 1024 * 1024);
//! let pool = create_pool(&config).await?;
//! ```
//!
//! Tests use [`create_test_pool`], an in-memory database on a single
//! connection.

use crate::{LibraryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default quota reported by the storage estimate (2 GiB).
pub const DEFAULT_STORAGE_QUOTA_BYTES: u64 = 2 * 1024 * 1024 * 1024;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS tracks (
        id TEXT PRIMARY KEY NOT NULL,
        title TEXT NOT NULL,
        artist TEXT NOT NULL,
        album TEXT,
        duration REAL NOT NULL DEFAULT 0,
        cover_url TEXT NOT NULL DEFAULT '',
        source TEXT NOT NULL CHECK (source IN ('local', 'remote')),
        uri TEXT NOT NULL,
        genre TEXT,
        added_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_tracks_added_at ON tracks (added_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS blobs (
        id TEXT PRIMARY KEY NOT NULL REFERENCES tracks (id) ON DELETE CASCADE,
        data BLOB NOT NULL,
        mime_type TEXT,
        size INTEGER NOT NULL
    )
    "#,
];

/// Database configuration for the SQLite connection pool
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `sqlite:<path>` or `sqlite::memory:`
    pub database_url: String,

    pub min_connections: u32,

    pub max_connections: u32,

    /// Maximum time to wait for a connection from the pool
    pub acquire_timeout: Duration,

    pub idle_timeout: Option<Duration>,

    /// Quota reported next to the used bytes by the storage estimate
    pub storage_quota_bytes: u64,
}

impl DatabaseConfig {
    /// Configuration for a database file at `database_path`
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        let path = database_path.into();

        Self {
            database_url: format!("sqlite:{}", path.display()),
            min_connections: 1,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            storage_quota_bytes: DEFAULT_STORAGE_QUOTA_BYTES,
        }
    }

    /// In-memory database.
    ///
    /// Every SQLite connection to `:memory:` opens a separate database, so
    /// the pool is pinned to one connection that never idles out.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            min_connections: 1,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: None,
            storage_quota_bytes: DEFAULT_STORAGE_QUOTA_BYTES,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:")
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn storage_quota_bytes(mut self, quota: u64) -> Self {
        self.storage_quota_bytes = quota;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Create a configured SQLite connection pool
///
/// Applies connection pragmas, creates the schema and runs a health check.
///
/// # Errors
///
/// Fails if the database cannot be opened, the schema cannot be created or
/// the health check query fails.
pub async fn create_pool(config: &DatabaseConfig) -> Result<Pool<Sqlite>> {
    info!(
        database_url = %config.database_url,
        max_connections = config.max_connections,
        "Creating database connection pool"
    );

    let mut connect_options =
        SqliteConnectOptions::from_str(&config.database_url).map_err(LibraryError::Database)?;

    connect_options = connect_options
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .create_if_missing(true);

    if !config.is_in_memory() {
        connect_options = connect_options.journal_mode(SqliteJournalMode::Wal);
    }

    let max_connections = if config.is_in_memory() {
        1
    } else {
        config.max_connections.max(1)
    };

    let pool = SqlitePoolOptions::new()
        .min_connections(config.min_connections.min(max_connections))
        .max_connections(max_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .connect_with(connect_options)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create connection pool");
            LibraryError::Database(e)
        })?;

    run_migrations(&pool).await?;
    health_check(&pool).await?;

    info!(connections = pool.size(), "Database connection pool ready");
    Ok(pool)
}

/// In-memory pool with the schema applied, for tests.
pub async fn create_test_pool() -> Result<Pool<Sqlite>> {
    create_pool(&DatabaseConfig::in_memory()).await
}

async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    debug!("Applying track store schema");

    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await.map_err(|e| {
            warn!(error = %e, "Schema statement failed");
            LibraryError::Migration(e.to_string())
        })?;
    }

    Ok(())
}

async fn health_check(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| {
        warn!(error = %e, "Database health check failed");
        LibraryError::Database(e)
    })?;
    Ok(())
}
