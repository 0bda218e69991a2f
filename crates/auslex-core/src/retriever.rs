//! Point-in-time snippet retriever.
//!
//! The retriever is a pure request/response orchestration with no state
//! of its own: it embeds the query, over-fetches candidates from the
//! [`SnippetStore`], applies jurisdiction and as-at filtering, adjusts
//! ranking, and truncates.
//!
//! # Algorithm
//!
//! 1. Resolve `limit` (default 8; an explicit limit below 1 is a caller
//!    error) and parse `as_at` (unparseable input fails fast — silently
//!    treating it as "today" could return legally wrong results).
//! 2. Embed the query (batch of one).
//! 3. Over-fetch `overfetch_factor × limit` nearest neighbors to leave
//!    headroom for post-retrieval filter attrition.
//! 4. Jurisdiction filter: case-folded substring match, when requested.
//! 5. As-at filter: drop snippets not in force on the reference date.
//!    Dropped means dropped — never merely deprioritized.
//! 6. Among survivors of an as-at query, snippets with no explicit
//!    in-force bounds matched only by default; penalize their score by
//!    `unbounded_penalty` and re-sort (stable), so explicitly evidenced
//!    temporal validity wins between equally similar snippets.
//! 7. Truncate to `limit`.

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;

use crate::embedding::{embed_query, EmbeddingProvider};
use crate::models::{Snippet, SnippetQuery};
use crate::store::SnippetStore;

/// Rejection of caller-supplied query input (bad `limit`, unparseable
/// `as_at`), as opposed to a backend failure.
///
/// Carried inside the [`anyhow::Error`] returned by
/// [`Retriever::search`]; callers that need to distinguish client
/// errors from backend errors (e.g. to pick an HTTP status) downcast
/// with [`anyhow::Error::is`] rather than inspecting message text.
#[derive(Debug)]
pub struct InvalidQuery(pub String);

impl std::fmt::Display for InvalidQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvalidQuery {}

/// Retrieval tuning knobs, decoupled from application config.
#[derive(Debug, Clone)]
pub struct RetrieverOptions {
    /// Result count used when a query does not specify `limit`.
    pub default_limit: usize,
    /// Candidate over-fetch multiplier compensating for filter attrition.
    pub overfetch_factor: usize,
    /// Score penalty for snippets with no in-force bounds when an
    /// as-at filter is active.
    pub unbounded_penalty: f64,
}

impl Default for RetrieverOptions {
    fn default() -> Self {
        Self {
            default_limit: 8,
            overfetch_factor: 2,
            unbounded_penalty: 0.05,
        }
    }
}

/// Query orchestrator over a [`SnippetStore`] and an [`EmbeddingProvider`].
///
/// Owned, injected instances — multiple independent retrievers can
/// coexist in one process (there is no global store).
pub struct Retriever {
    store: Arc<dyn SnippetStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    options: RetrieverOptions,
}

impl Retriever {
    pub fn new(store: Arc<dyn SnippetStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_options(store, embedder, RetrieverOptions::default())
    }

    pub fn with_options(
        store: Arc<dyn SnippetStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        options: RetrieverOptions,
    ) -> Self {
        Self {
            store,
            embedder,
            options,
        }
    }

    /// Run one retrieval request and return the top snippets, ordered.
    ///
    /// Zero matches is a valid empty success; embedding and store
    /// failures propagate unchanged.
    pub async fn search(&self, query: &SnippetQuery) -> Result<Vec<Snippet>> {
        let limit = match query.limit {
            None => self.options.default_limit,
            Some(l) if l >= 1 => l as usize,
            Some(l) => {
                return Err(InvalidQuery(format!("limit must be at least 1, got {}", l)).into())
            }
        };

        let as_at = query
            .as_at
            .as_deref()
            .map(|s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
                    InvalidQuery(format!("Invalid as-at date: '{}' (expected YYYY-MM-DD)", s))
                })
            })
            .transpose()?;

        let query_vec = embed_query(self.embedder.as_ref(), &query.query).await?;

        let mut candidates = self
            .store
            .similarity_search(&query_vec, self.options.overfetch_factor.saturating_mul(limit))
            .await?;

        if let Some(jurisdiction) = query.jurisdiction.as_deref() {
            candidates.retain(|c| c.snippet.metadata.matches_jurisdiction(jurisdiction));
        }

        if let Some(as_at) = as_at {
            candidates.retain(|c| c.snippet.metadata.in_force_at(as_at));

            for c in &mut candidates {
                if !c.snippet.metadata.has_force_bounds() {
                    c.score -= self.options.unbounded_penalty;
                }
            }
            // Stable sort: equal adjusted scores keep similarity order.
            candidates.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        candidates.truncate(limit);
        Ok(candidates.into_iter().map(|c| c.snippet).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SnippetMetadata;
    use crate::store::memory::InMemorySnippetStore;
    use anyhow::Result;
    use async_trait::async_trait;

    /// Embedder returning one fixed vector for every input, so tests
    /// control ranking purely through the stored vectors.
    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        fn model_name(&self) -> &str {
            "fixed"
        }
        fn dims(&self) -> usize {
            self.0.len()
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| self.0.clone()).collect())
        }
    }

    /// Embedder that always fails, for error propagation tests.
    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        fn model_name(&self) -> &str {
            "failing"
        }
        fn dims(&self) -> usize {
            0
        }
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            anyhow::bail!("embedding backend unavailable")
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn snippet(id: &str, jurisdiction: &str, from: Option<&str>, to: Option<&str>) -> Snippet {
        Snippet {
            id: id.to_string(),
            text: format!("text of {}", id),
            metadata: SnippetMetadata {
                jurisdiction: jurisdiction.to_string(),
                date_in_force_from: from.map(date),
                date_in_force_to: to.map(date),
                ..Default::default()
            },
        }
    }

    async fn seeded_store(entries: Vec<(Snippet, Vec<f32>)>) -> Arc<InMemorySnippetStore> {
        let store = Arc::new(InMemorySnippetStore::new());
        let (snippets, vectors): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        store.upsert(&snippets, &vectors).await.unwrap();
        store
    }

    fn query(q: &str) -> SnippetQuery {
        SnippetQuery {
            query: q.to_string(),
            jurisdiction: None,
            as_at: None,
            limit: None,
        }
    }

    #[tokio::test]
    async fn test_jurisdiction_filter_case_insensitive() {
        let store = seeded_store(vec![
            (snippet("cth", "Cth", None, None), vec![1.0, 0.0]),
            (snippet("nsw", "NSW", None, None), vec![1.0, 0.0]),
            (snippet("vic", "VIC", None, None), vec![1.0, 0.0]),
        ])
        .await;
        let retriever = Retriever::new(store, Arc::new(FixedEmbedder(vec![1.0, 0.0])));

        let mut q = query("character test");
        q.jurisdiction = Some("cth".to_string());
        let results = retriever.search(&q).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "cth");
    }

    #[tokio::test]
    async fn test_as_at_excludes_out_of_force() {
        let store = seeded_store(vec![(
            snippet("repealed", "Cth", Some("2020-01-01"), Some("2021-01-01")),
            vec![1.0, 0.0],
        )])
        .await;
        let retriever = Retriever::new(store, Arc::new(FixedEmbedder(vec![1.0, 0.0])));

        let mut q = query("old provision");
        q.as_at = Some("2022-01-01".to_string());
        assert!(retriever.search(&q).await.unwrap().is_empty());

        q.as_at = Some("2020-06-01".to_string());
        let results = retriever.search(&q).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "repealed");
    }

    #[tokio::test]
    async fn test_unbounded_ranked_below_equal_bounded() {
        // Equal similarity: the snippet with explicit in-force bounds
        // must outrank the always-in-force default, despite being
        // inserted later.
        let store = seeded_store(vec![
            (snippet("unbounded", "Cth", None, None), vec![1.0, 0.0]),
            (
                snippet("bounded", "Cth", Some("2010-01-01"), None),
                vec![1.0, 0.0],
            ),
        ])
        .await;
        let retriever = Retriever::new(store, Arc::new(FixedEmbedder(vec![1.0, 0.0])));

        let mut q = query("anything");
        q.as_at = Some("2015-06-01".to_string());
        let results = retriever.search(&q).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["bounded", "unbounded"]);

        // Without as_at the penalty does not apply: pure tie-break order.
        q.as_at = None;
        let results = retriever.search(&q).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["unbounded", "bounded"]);
    }

    #[tokio::test]
    async fn test_invalid_as_at_rejected() {
        let store = seeded_store(vec![(snippet("a", "Cth", None, None), vec![1.0])]).await;
        let retriever = Retriever::new(store, Arc::new(FixedEmbedder(vec![1.0])));

        for bad in ["not-a-date", "", "2020-13-40"] {
            let mut q = query("anything");
            q.as_at = Some(bad.to_string());
            let err = retriever.search(&q).await.unwrap_err();
            assert!(
                err.is::<InvalidQuery>(),
                "expected InvalidQuery for '{}', got: {}",
                bad,
                err
            );
            assert!(err.to_string().contains("as-at"));
        }
    }

    #[tokio::test]
    async fn test_limit_defaults_and_rejects_nonpositive() {
        let entries: Vec<(Snippet, Vec<f32>)> = (0..12)
            .map(|i| (snippet(&format!("s{}", i), "Cth", None, None), vec![1.0]))
            .collect();
        let store = seeded_store(entries).await;
        let retriever = Retriever::new(store, Arc::new(FixedEmbedder(vec![1.0])));

        let q = query("anything");
        assert_eq!(retriever.search(&q).await.unwrap().len(), 8);

        let mut q = query("anything");
        q.limit = Some(3);
        assert_eq!(retriever.search(&q).await.unwrap().len(), 3);

        q.limit = Some(0);
        assert!(retriever
            .search(&q)
            .await
            .unwrap_err()
            .is::<InvalidQuery>());
        q.limit = Some(-2);
        assert!(retriever
            .search(&q)
            .await
            .unwrap_err()
            .is::<InvalidQuery>());
    }

    #[tokio::test]
    async fn test_huge_limit_does_not_overflow_overfetch() {
        let store = seeded_store(vec![(snippet("a", "Cth", None, None), vec![1.0])]).await;
        let retriever = Retriever::new(store, Arc::new(FixedEmbedder(vec![1.0])));

        let mut q = query("anything");
        q.limit = Some(i64::MAX);
        let results = retriever.search(&q).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let store = seeded_store(vec![(snippet("a", "Cth", None, None), vec![1.0])]).await;
        let retriever = Retriever::new(store, Arc::new(FailingEmbedder));

        let err = retriever.search(&query("anything")).await.unwrap_err();
        assert!(err.to_string().contains("unavailable"));
        // Backend failures are not client-input rejections.
        assert!(!err.is::<InvalidQuery>());
    }

    #[tokio::test]
    async fn test_empty_store_is_empty_success() {
        let store = Arc::new(InMemorySnippetStore::new());
        let retriever = Retriever::new(store, Arc::new(FixedEmbedder(vec![1.0])));
        assert!(retriever.search(&query("anything")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_character_test_scenario() {
        // Seed scenario: Migration Act s 501 character test snippet.
        let store = seeded_store(vec![(
            Snippet {
                id: "demo_0".to_string(),
                text: "[45] Character test includes substantial criminal record.".to_string(),
                metadata: SnippetMetadata {
                    jurisdiction: "Cth".to_string(),
                    citation: Some("Migration Act 1958 (Cth) s 501".to_string()),
                    date_in_force_from: Some(date("1958-01-01")),
                    date_in_force_to: None,
                    ..Default::default()
                },
            },
            vec![0.4, 0.9],
        )])
        .await;
        let retriever = Retriever::new(store, Arc::new(FixedEmbedder(vec![0.4, 0.9])));

        let mut q = query("What is the character test under s 501?");
        q.jurisdiction = Some("Cth".to_string());
        let results = retriever.search(&q).await.unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].id, "demo_0");

        // Still in force at an historical date (open-ended to).
        q.as_at = Some("2000-01-01".to_string());
        let results = retriever.search(&q).await.unwrap();
        assert!(results.iter().any(|s| s.id == "demo_0"));

        // Wrong jurisdiction excludes it entirely.
        q.as_at = None;
        q.jurisdiction = Some("NSW".to_string());
        assert!(retriever.search(&q).await.unwrap().is_empty());
    }
}
