//! Settings Store Implementation using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SettingsStore,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Row, SqlitePool,
};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

/// SQLite-based settings store
///
/// Values are stored as text next to a type tag so a key written as an
/// integer cannot be read back as a boolean by accident.
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    String,
    I64,
    Bool,
}

impl ValueKind {
    fn tag(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::I64 => "i64",
            ValueKind::Bool => "bool",
        }
    }
}

impl SqliteSettingsStore {
    /// Open (or create) the settings database at `db_path`
    pub async fn open(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect: {}", e)))?;

        Self::with_pool(pool).await
    }

    /// In-memory store, useful for tests and ephemeral sessions
    pub async fn in_memory() -> Result<Self> {
        // Each connection to `:memory:` gets its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect: {}", e)))?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                kind TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to create table: {}", e)))?;

        Ok(Self { pool })
    }

    async fn write(&self, key: &str, value: String, kind: ValueKind) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, kind, updated_at)
            VALUES (?, ?, ?, strftime('%s', 'now'))
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                kind = excluded.kind,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(&value)
        .bind(kind.tag())
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to write setting: {}", e)))?;

        debug!(key, kind = kind.tag(), "Setting written");
        Ok(())
    }

    async fn read(&self, key: &str, expected: ValueKind) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value, kind FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to read setting: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let kind: String = row.get("kind");
        if kind != expected.tag() {
            return Err(BridgeError::OperationFailed(format!(
                "Setting '{}' holds a {} value, not {}",
                key,
                kind,
                expected.tag()
            )));
        }

        Ok(Some(row.get("value")))
    }

    async fn read_parsed<T: FromStr>(&self, key: &str, expected: ValueKind) -> Result<Option<T>> {
        match self.read(key, expected).await? {
            Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
                BridgeError::OperationFailed(format!(
                    "Setting '{}' is not a valid {}",
                    key,
                    expected.tag()
                ))
            }),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.write(key, value.to_string(), ValueKind::String).await
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.read(key, ValueKind::String).await
    }

    async fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.write(key, value.to_string(), ValueKind::I64).await
    }

    async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        self.read_parsed(key, ValueKind::I64).await
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.write(key, value.to_string(), ValueKind::Bool).await
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        self.read_parsed(key, ValueKind::Bool).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to delete setting: {}", e)))?;
        Ok(())
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to check key: {}", e)))?;
        Ok(row.is_some())
    }
}
