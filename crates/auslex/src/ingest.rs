//! JSONL corpus ingestion pipeline.
//!
//! Reads one snippet per line, batch-embeds via the configured
//! provider, and upserts snippets with their vectors through the store
//! trait. Each embed batch is upserted in one store transaction, so a
//! failed batch leaves no partial snippets behind.
//!
//! Embedding input combines the citation (when present) with the
//! snippet text, which anchors section-number queries like "s 501" to
//! the right provision.

use anyhow::{bail, Context, Result};
use std::path::Path;

use auslex_core::models::Snippet;

use crate::config::Config;
use crate::embedding;
use crate::store;

/// Parse a JSONL corpus file into snippets. Blank lines are skipped;
/// a malformed line fails the whole run with its line number.
pub fn load_corpus_file(path: &Path) -> Result<Vec<Snippet>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;

    let mut snippets = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let snippet: Snippet = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: invalid snippet", path.display(), line_no + 1))?;
        if snippet.id.is_empty() {
            bail!("{}:{}: snippet id must not be empty", path.display(), line_no + 1);
        }
        snippets.push(snippet);
    }
    Ok(snippets)
}

/// Text sent to the embedding provider for a snippet.
pub fn embedding_input(snippet: &Snippet) -> String {
    match snippet.metadata.citation.as_deref() {
        Some(citation) => format!("{} {}", citation, snippet.text),
        None => snippet.text.clone(),
    }
}

/// Run the ingest command: parse, embed in batches, upsert.
pub async fn run_ingest(config: &Config, file: &Path) -> Result<()> {
    if !config.embedding.is_enabled() {
        bail!("Ingest requires embeddings. Set [embedding] provider in config.");
    }

    let snippets = load_corpus_file(file)?;
    if snippets.is_empty() {
        println!("No snippets in {}.", file.display());
        return Ok(());
    }

    let provider = embedding::create_provider(&config.embedding)?;
    let store = store::open_store(config).await?;

    let mut upserted = 0usize;
    for batch in snippets.chunks(config.embedding.batch_size) {
        let texts: Vec<String> = batch.iter().map(embedding_input).collect();
        let vectors = provider.embed(&texts).await?;
        if vectors.len() != batch.len() {
            bail!(
                "Embedding provider returned {} vectors for {} texts",
                vectors.len(),
                batch.len()
            );
        }
        store.upsert(batch, &vectors).await?;
        upserted += batch.len();
        println!("  embedded + upserted {}/{}", upserted, snippets.len());
    }

    println!();
    println!("upserted snippets: {}", upserted);
    println!("store now holds {} snippets", store.count().await?);
    println!("ok");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use auslex_core::models::{SnippetMetadata, SourceType};
    use std::io::Write;

    #[test]
    fn test_load_corpus_file_parses_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"id":"a","text":"alpha","metadata":{{"jurisdiction":"Cth","source_type":"legislation","date_in_force_from":"1958-01-01"}}}}"#
        )
        .unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"id":"b","text":"beta","metadata":{{"jurisdiction":"NSW"}}}}"#).unwrap();

        let snippets = load_corpus_file(file.path()).unwrap();
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].metadata.source_type, SourceType::Legislation);
        assert!(snippets[0].metadata.date_in_force_from.is_some());
        assert_eq!(snippets[1].metadata.jurisdiction, "NSW");
    }

    #[test]
    fn test_load_corpus_file_reports_bad_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id":"a","text":"alpha","metadata":{{"jurisdiction":"Cth"}}}}"#).unwrap();
        writeln!(file, "not json").unwrap();

        let err = load_corpus_file(file.path()).unwrap_err();
        assert!(err.to_string().contains(":2"));
    }

    #[test]
    fn test_load_corpus_file_rejects_malformed_date() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"id":"a","text":"alpha","metadata":{{"jurisdiction":"Cth","date_in_force_from":"01/01/1958"}}}}"#
        )
        .unwrap();
        assert!(load_corpus_file(file.path()).is_err());
    }

    #[test]
    fn test_embedding_input_prefixes_citation() {
        let snippet = Snippet {
            id: "s501".to_string(),
            text: "Character test provisions.".to_string(),
            metadata: SnippetMetadata {
                jurisdiction: "Cth".to_string(),
                citation: Some("Migration Act 1958 (Cth) s 501".to_string()),
                ..Default::default()
            },
        };
        assert_eq!(
            embedding_input(&snippet),
            "Migration Act 1958 (Cth) s 501 Character test provisions."
        );
    }
}
