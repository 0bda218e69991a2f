//! Storage abstraction for AusLex snippets.
//!
//! The [`SnippetStore`] trait defines the storage operations needed by
//! the retriever, enabling pluggable backends (in-memory, SQLite). The
//! two backends are alternative deployment configurations selected at
//! construction time — never a fallback chain.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Snippet;

/// A candidate snippet returned from similarity search, carrying its
/// raw cosine similarity so the retriever can re-rank after filtering.
#[derive(Debug, Clone)]
pub struct SnippetCandidate {
    pub snippet: Snippet,
    /// Cosine similarity to the query embedding.
    pub score: f64,
}

/// Abstract storage backend holding snippets and their embeddings.
///
/// Invariant: every stored snippet has exactly one current embedding.
/// Re-upserting an `id` replaces text, metadata, and embedding as one
/// unit — a concurrent search observes either the old record or the new
/// one, never a mix.
#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Insert or replace snippets keyed by `id`, paired 1:1 with their
    /// embedding vectors.
    ///
    /// Idempotent end state for repeated calls with overlapping ids. A
    /// batch is applied all-or-nothing. An empty batch is a no-op.
    async fn upsert(&self, snippets: &[Snippet], vectors: &[Vec<f32>]) -> Result<()>;

    /// Return the `limit` snippets nearest to `query_vec` by cosine
    /// similarity, ordered by descending similarity.
    ///
    /// Ties break by insertion order (earlier-inserted first) so results
    /// are deterministic; a re-upserted snippet counts as newly inserted.
    /// An empty store yields an empty list, not an error.
    async fn similarity_search(
        &self,
        query_vec: &[f32],
        limit: usize,
    ) -> Result<Vec<SnippetCandidate>>;

    /// Number of distinct snippet ids currently stored.
    async fn count(&self) -> Result<usize>;
}

/// Shared descending-score, ascending-insertion-order sort used by
/// both store backends so tie-breaking stays identical across them.
/// Each candidate is paired with its insertion sequence number.
pub fn rank_candidates(candidates: &mut [(SnippetCandidate, u64)]) {
    candidates.sort_by(|(a, a_seq), (b, b_seq)| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a_seq.cmp(b_seq))
    });
}
