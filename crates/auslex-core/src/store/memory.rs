//! In-memory [`SnippetStore`] implementation.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`; similarity search is
//! brute-force cosine over all stored vectors. Each record is replaced
//! whole under the write lock, so concurrent searches see either the
//! pre- or post-upsert state for a key, never a half-written entry.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::Snippet;

use super::{rank_candidates, SnippetCandidate, SnippetStore};

struct StoredSnippet {
    snippet: Snippet,
    vector: Vec<f32>,
    /// Monotonic insertion sequence; re-upsert assigns a fresh one.
    seq: u64,
}

/// In-memory snippet store for tests and ephemeral deployments.
pub struct InMemorySnippetStore {
    inner: RwLock<Inner>,
}

struct Inner {
    entries: HashMap<String, StoredSnippet>,
    next_seq: u64,
}

impl InMemorySnippetStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                next_seq: 0,
            }),
        }
    }
}

impl Default for InMemorySnippetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnippetStore for InMemorySnippetStore {
    async fn upsert(&self, snippets: &[Snippet], vectors: &[Vec<f32>]) -> Result<()> {
        if snippets.len() != vectors.len() {
            bail!(
                "upsert got {} snippets but {} vectors",
                snippets.len(),
                vectors.len()
            );
        }
        if snippets.is_empty() {
            return Ok(());
        }

        let mut inner = self.inner.write().unwrap();
        for (snippet, vector) in snippets.iter().zip(vectors.iter()) {
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.entries.insert(
                snippet.id.clone(),
                StoredSnippet {
                    snippet: snippet.clone(),
                    vector: vector.clone(),
                    seq,
                },
            );
        }
        Ok(())
    }

    async fn similarity_search(
        &self,
        query_vec: &[f32],
        limit: usize,
    ) -> Result<Vec<SnippetCandidate>> {
        let inner = self.inner.read().unwrap();
        let mut candidates: Vec<(SnippetCandidate, u64)> = inner
            .entries
            .values()
            .map(|stored| {
                (
                    SnippetCandidate {
                        snippet: stored.snippet.clone(),
                        score: cosine_similarity(query_vec, &stored.vector) as f64,
                    },
                    stored.seq,
                )
            })
            .collect();

        rank_candidates(&mut candidates);
        candidates.truncate(limit);
        Ok(candidates.into_iter().map(|(c, _)| c).collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.read().unwrap().entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SnippetMetadata;

    fn snippet(id: &str, text: &str) -> Snippet {
        Snippet {
            id: id.to_string(),
            text: text.to_string(),
            metadata: SnippetMetadata {
                jurisdiction: "Cth".to_string(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_empty_store_returns_empty() {
        let store = InMemorySnippetStore::new();
        let results = store.similarity_search(&[1.0, 0.0], 5).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_upsert_is_noop() {
        let store = InMemorySnippetStore::new();
        store.upsert(&[], &[]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upsert_length_mismatch_rejected() {
        let store = InMemorySnippetStore::new();
        let err = store
            .upsert(&[snippet("a", "alpha")], &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("vectors"));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let store = InMemorySnippetStore::new();
        store
            .upsert(
                &[snippet("far", "far"), snippet("near", "near")],
                &[vec![0.0, 1.0], vec![1.0, 0.1]],
            )
            .await
            .unwrap();

        let results = store.similarity_search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results[0].snippet.id, "near");
        assert_eq!(results[1].snippet.id, "far");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_ties_break_by_insertion_order() {
        let store = InMemorySnippetStore::new();
        // Identical vectors: insertion order decides.
        store
            .upsert(
                &[snippet("first", "a"), snippet("second", "b"), snippet("third", "c")],
                &[vec![1.0, 0.0], vec![1.0, 0.0], vec![1.0, 0.0]],
            )
            .await
            .unwrap();

        for _ in 0..3 {
            let results = store.similarity_search(&[1.0, 0.0], 3).await.unwrap();
            let ids: Vec<&str> = results.iter().map(|c| c.snippet.id.as_str()).collect();
            assert_eq!(ids, vec!["first", "second", "third"]);
        }
    }

    #[tokio::test]
    async fn test_upsert_idempotent() {
        let store = InMemorySnippetStore::new();
        let s = snippet("a", "alpha");
        let v = vec![1.0, 0.0];
        store.upsert(&[s.clone()], &[v.clone()]).await.unwrap();
        store.upsert(&[s], &[v]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        let results = store.similarity_search(&[1.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_old_vector() {
        let store = InMemorySnippetStore::new();
        store
            .upsert(&[snippet("a", "old text")], &[vec![1.0, 0.0]])
            .await
            .unwrap();
        store
            .upsert(&[snippet("a", "new text")], &[vec![0.0, 1.0]])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let results = store.similarity_search(&[0.0, 1.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].snippet.text, "new text");
        assert!(results[0].score > 0.99);
    }

    #[tokio::test]
    async fn test_reupsert_moves_to_end_of_insertion_order() {
        let store = InMemorySnippetStore::new();
        store
            .upsert(
                &[snippet("a", "a"), snippet("b", "b")],
                &[vec![1.0], vec![1.0]],
            )
            .await
            .unwrap();
        // Re-upserting "a" pushes it behind "b" on equal similarity.
        store.upsert(&[snippet("a", "a2")], &[vec![1.0]]).await.unwrap();

        let results = store.similarity_search(&[1.0], 2).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|c| c.snippet.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_limit_respected() {
        let store = InMemorySnippetStore::new();
        let snippets: Vec<Snippet> = (0..5)
            .map(|i| snippet(&format!("s{}", i), "text"))
            .collect();
        let vectors: Vec<Vec<f32>> = (0..5).map(|i| vec![1.0, i as f32 * 0.1]).collect();
        store.upsert(&snippets, &vectors).await.unwrap();

        assert_eq!(store.similarity_search(&[1.0, 0.0], 3).await.unwrap().len(), 3);
        assert_eq!(store.similarity_search(&[1.0, 0.0], 8).await.unwrap().len(), 5);
    }
}
