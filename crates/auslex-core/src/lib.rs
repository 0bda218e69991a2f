//! # AusLex Core
//!
//! Shared retrieval logic for AusLex: legal snippet models, the snippet
//! store abstraction, the point-in-time retriever, and the embedding
//! provider trait.
//!
//! This crate contains no tokio, sqlx, network, or filesystem
//! dependencies. Store and provider implementations that need real I/O
//! (SQLite, OpenAI, Ollama) live in the `auslex` app crate.

pub mod embedding;
pub mod models;
pub mod retriever;
pub mod store;
pub mod testing;
