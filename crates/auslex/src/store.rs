//! Store backend selection.
//!
//! Both backends satisfy the same `SnippetStore` contract; which one a
//! deployment uses is fixed by `[store].backend` at construction time.
//! There is deliberately no fallback from sqlite to memory — an
//! unreachable database is an error, not a degraded mode.

use std::sync::Arc;

use anyhow::{bail, Result};

use auslex_core::store::memory::InMemorySnippetStore;
use auslex_core::store::SnippetStore;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteSnippetStore;

/// Open the configured store backend.
///
/// The sqlite backend connects (creating the file if missing) and runs
/// migrations so first use does not require a separate `init`.
pub async fn open_store(config: &Config) -> Result<Arc<dyn SnippetStore>> {
    match config.store.backend.as_str() {
        "memory" => Ok(Arc::new(InMemorySnippetStore::new())),
        "sqlite" => {
            let pool = db::connect(&config.store.path).await?;
            migrate::run_migrations(&pool).await?;
            Ok(Arc::new(SqliteSnippetStore::new(pool)))
        }
        other => bail!("Unknown store backend: '{}'. Must be sqlite or memory.", other),
    }
}
