//! CLI search command.
//!
//! Thin wrapper over the core retriever: builds the store and provider
//! from config, runs one query, and prints ranked snippets. The same
//! retriever backs `POST /search` in [`crate::server`].

use anyhow::{bail, Result};

use auslex_core::models::{Snippet, SnippetQuery};
use auslex_core::retriever::Retriever;

use crate::config::Config;
use crate::embedding;
use crate::store;

/// Builds a one-shot retriever from config and runs a single query.
///
/// `POST /search` shares the retrieval pipeline but not this function:
/// the server constructs its store and provider once at startup
/// instead of per request.
pub async fn search_snippets(config: &Config, query: &SnippetQuery) -> Result<Vec<Snippet>> {
    if query.query.trim().is_empty() {
        return Ok(Vec::new());
    }
    if !config.embedding.is_enabled() {
        bail!("Search requires embeddings. Set [embedding] provider in config.");
    }

    let store = store::open_store(config).await?;
    let provider = embedding::create_provider(&config.embedding)?;
    let retriever = Retriever::with_options(store, provider, config.retriever_options());

    retriever.search(query).await
}

/// CLI entry point — calls [`search_snippets`] and prints results.
pub async fn run_search(
    config: &Config,
    query: &str,
    jurisdiction: Option<String>,
    as_at: Option<String>,
    limit: Option<i64>,
) -> Result<()> {
    let request = SnippetQuery {
        query: query.to_string(),
        jurisdiction,
        as_at: as_at.clone(),
        limit,
    };
    let results = search_snippets(config, &request).await?;

    if results.is_empty() {
        println!("No sources found.");
        return Ok(());
    }

    for (i, snippet) in results.iter().enumerate() {
        let citation = snippet
            .metadata
            .citation
            .as_deref()
            .unwrap_or("(no citation)");
        println!(
            "{}. {} [{}] ({})",
            i + 1,
            citation,
            snippet.metadata.jurisdiction,
            snippet.metadata.source_type.as_str()
        );
        println!("    in force: {}", in_force_display(snippet));
        if let Some(ref url) = snippet.metadata.url {
            println!("    url: {}", url);
        }
        println!(
            "    excerpt: \"{}\"",
            excerpt(&snippet.text).replace('\n', " ")
        );
        println!("    id: {}", snippet.id);
        println!();
    }

    if let Some(as_at) = as_at {
        println!("({} source(s) in force as at {})", results.len(), as_at);
    }

    Ok(())
}

fn in_force_display(snippet: &Snippet) -> String {
    match (
        snippet.metadata.date_in_force_from,
        snippet.metadata.date_in_force_to,
    ) {
        (None, None) => "no recorded bounds".to_string(),
        (Some(from), None) => format!("{} — current", from),
        (None, Some(to)) => format!("until {}", to),
        (Some(from), Some(to)) => format!("{} — {}", from, to),
    }
}

fn excerpt(text: &str) -> String {
    text.chars().take(240).collect()
}
