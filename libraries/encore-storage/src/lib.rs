//! Encore Storage
//!
//! Persistence adapters implementing [`encore_core::KeyValueStore`].
//!
//! The playback core serializes its own snapshot and only needs an async
//! get/set of byte blobs. Two adapters are provided:
//!
//! - [`SqliteStore`]: durable, one `SQLite` file on device
//! - [`MemoryStore`]: in-process, for tests and ephemeral sessions
//!
//! # Example
//!
//! ```rust,no_run
//! use encore_core::KeyValueStore;
//! use encore_storage::SqliteStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::connect("sqlite://encore.db").await?;
//! store.set("encore.player.v1", b"{}").await?;
//! let value = store.get("encore.player.v1").await?;
//! assert_eq!(value.as_deref(), Some(&b"{}"[..]));
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
mod sqlite;

pub use error::{Result, StorageError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// In-memory URLs get a single connection, since every `SQLite` memory
/// connection is its own database.
///
/// # Errors
///
/// Returns an error if the URL is empty or the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    if database_url.trim().is_empty() {
        return Err(StorageError::Connection("empty database URL".to_string()));
    }

    tracing::debug!("Creating kv pool for {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}
