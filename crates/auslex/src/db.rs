//! SQLite connection management.
//!
//! Provides a connection pool with WAL mode enabled so concurrent
//! searches and an ingestion run can overlap without blocking. The
//! database file and its parent directories are created on demand.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Create a connection pool to the SQLite database at `db_path`.
///
/// - Creates the database file and parent directories if missing.
/// - Enables WAL journal mode for concurrent read/write.
/// - Returns a pool with up to 5 connections.
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}
