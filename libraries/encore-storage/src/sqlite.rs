//! SQLite-backed key-value store
//!
//! One `kv_store` table, one row per key. This is the durable store used on
//! device: a single small database file in the app's data directory.

use async_trait::async_trait;
use encore_core::KeyValueStore;
use sqlx::SqlitePool;

use crate::error::{Result, StorageError};

/// Key-value store persisted in `SQLite`
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `database_url` and apply migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or the migrations fail
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = crate::create_pool(database_url).await?;
        crate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Wrap a pool that already has migrations applied
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Delete the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the delete statement fails
    pub async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// All stored keys, sorted
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn keys(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(key,)| key).collect())
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(key)
             DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> encore_core::Result<Option<Vec<u8>>> {
        self.read(key).await.map_err(|e| {
            tracing::debug!("kv read of {} failed: {}", key, e);
            e.into()
        })
    }

    async fn set(&self, key: &str, value: &[u8]) -> encore_core::Result<()> {
        self.write(key, value)
            .await
            .map_err(|e: StorageError| e.into())
    }
}
