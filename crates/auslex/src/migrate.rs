//! Database schema migrations (idempotent).
//!
//! One table holds each snippet and its embedding side by side, so an
//! upsert replaces text, metadata, and vector in a single row write.
//! `seq` is an AUTOINCREMENT rowid used as the insertion-order
//! tie-break for equal similarity scores; deleting and re-inserting a
//! snippet id assigns a fresh `seq`, matching the in-memory store.

use anyhow::Result;
use sqlx::SqlitePool;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS snippets (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            text TEXT NOT NULL,
            jurisdiction TEXT NOT NULL,
            source_type TEXT NOT NULL DEFAULT 'other',
            title TEXT,
            citation TEXT,
            provision TEXT,
            paragraph TEXT,
            url TEXT,
            date_in_force_from TEXT,
            date_in_force_to TEXT,
            embedding BLOB NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_snippets_jurisdiction ON snippets(jurisdiction)")
        .execute(pool)
        .await?;

    Ok(())
}
