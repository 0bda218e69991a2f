//! # AusLex
//!
//! **Embedding-backed retrieval over Australian legal snippets with
//! jurisdiction and point-in-time ("as-at") filtering.**
//!
//! AusLex ingests a corpus of legal snippets (legislation excerpts,
//! holdings, guidelines), embeds them, and answers free-text queries
//! with the snippets that were in force on a requested reference date.
//! The surrounding answer-assembly layer (LLM prompting, citations UI)
//! is a separate consumer of this service.
//!
//! ## Data Flow
//!
//! 1. `auslex ingest corpus.jsonl` reads one snippet per line,
//!    batch-embeds via the configured provider ([`embedding`]), and
//!    upserts snippets + vectors through the store trait.
//! 2. `auslex search "..."` embeds the query, over-fetches nearest
//!    neighbors from the store, and applies jurisdiction and as-at
//!    filtering with a stability tie-break
//!    (`auslex_core::retriever`).
//! 3. `auslex serve` exposes the same retrieval as `POST /search`
//!    ([`server`]) for the answer-assembly layer.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Database schema migrations (idempotent) |
//! | [`sqlite_store`] | SQLite-backed `SnippetStore` implementation |
//! | [`store`] | Store backend selection (sqlite or memory) |
//! | [`embedding`] | OpenAI and Ollama embedding providers |
//! | [`ingest`] | JSONL corpus ingestion pipeline |
//! | [`search`] | CLI search command |
//! | [`stats`] | Corpus statistics overview |
//! | [`server`] | HTTP search endpoint (Axum) with CORS |

pub mod config;
pub mod db;
pub mod embedding;
pub mod ingest;
pub mod migrate;
pub mod search;
pub mod server;
pub mod sqlite_store;
pub mod stats;
pub mod store;

pub use auslex_core::models::{Snippet, SnippetMetadata, SnippetQuery, SourceType};
pub use auslex_core::retriever::{Retriever, RetrieverOptions};
