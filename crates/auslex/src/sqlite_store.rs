//! SQLite-backed [`SnippetStore`] implementation.
//!
//! Embeddings are stored as little-endian f32 BLOBs next to the snippet
//! row; similarity search loads all rows and ranks by cosine in Rust,
//! which is exact and comfortably fast at the corpus sizes in scope.
//! Batch upserts run inside one transaction, so a batch is visible
//! all-or-nothing.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};

use auslex_core::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use auslex_core::models::{Snippet, SnippetMetadata};
use auslex_core::store::{rank_candidates, SnippetCandidate, SnippetStore};

/// SQLite implementation of the [`SnippetStore`] trait.
pub struct SqliteSnippetStore {
    pool: SqlitePool,
}

impl SqliteSnippetStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn date_to_column(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

fn date_from_column(value: Option<String>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map_err(|e| anyhow::anyhow!("Corrupt in-force date '{}' in store: {}", s, e))
        })
        .transpose()
}

fn snippet_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Snippet> {
    let source_type: String = row.get("source_type");
    Ok(Snippet {
        id: row.get("id"),
        text: row.get("text"),
        metadata: SnippetMetadata {
            jurisdiction: row.get("jurisdiction"),
            source_type: source_type.parse()?,
            title: row.get("title"),
            citation: row.get("citation"),
            provision: row.get("provision"),
            paragraph: row.get("paragraph"),
            url: row.get("url"),
            date_in_force_from: date_from_column(row.get("date_in_force_from"))?,
            date_in_force_to: date_from_column(row.get("date_in_force_to"))?,
        },
    })
}

#[async_trait]
impl SnippetStore for SqliteSnippetStore {
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

        let mut tx = self.pool.begin().await?;

        for (snippet, vector) in snippets.iter().zip(vectors.iter()) {
            // Delete-then-insert so the replacement takes a fresh seq,
            // keeping tie-break order identical to the memory store.
            sqlx::query("DELETE FROM snippets WHERE id = ?")
                .bind(&snippet.id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO snippets (id, text, jurisdiction, source_type, title,
                                      citation, provision, paragraph, url,
                                      date_in_force_from, date_in_force_to, embedding)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&snippet.id)
            .bind(&snippet.text)
            .bind(&snippet.metadata.jurisdiction)
            .bind(snippet.metadata.source_type.as_str())
            .bind(&snippet.metadata.title)
            .bind(&snippet.metadata.citation)
            .bind(&snippet.metadata.provision)
            .bind(&snippet.metadata.paragraph)
            .bind(&snippet.metadata.url)
            .bind(date_to_column(snippet.metadata.date_in_force_from))
            .bind(date_to_column(snippet.metadata.date_in_force_to))
            .bind(vec_to_blob(vector))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn similarity_search(
        &self,
        query_vec: &[f32],
        limit: usize,
    ) -> Result<Vec<SnippetCandidate>> {
        let rows = sqlx::query(
            r#"
            SELECT seq, id, text, jurisdiction, source_type, title, citation,
                   provision, paragraph, url, date_in_force_from,
                   date_in_force_to, embedding
            FROM snippets
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut candidates: Vec<(SnippetCandidate, u64)> = Vec::with_capacity(rows.len());
        for row in &rows {
            let blob: Vec<u8> = row.get("embedding");
            let vector = blob_to_vec(&blob);
            let seq: i64 = row.get("seq");
            candidates.push((
                SnippetCandidate {
                    snippet: snippet_from_row(row)?,
                    score: cosine_similarity(query_vec, &vector) as f64,
                },
                seq as u64,
            ));
        }

        rank_candidates(&mut candidates);
        candidates.truncate(limit);
        Ok(candidates.into_iter().map(|(c, _)| c).collect())
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM snippets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}
