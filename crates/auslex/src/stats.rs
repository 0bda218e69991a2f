//! Corpus statistics overview.
//!
//! A quick summary of what's in the store: snippet counts, in-force
//! coverage, and a per-jurisdiction breakdown. Used by `auslex stats`
//! to give confidence that ingestion is working as expected.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;
use crate::migrate;

struct JurisdictionStats {
    jurisdiction: String,
    snippet_count: i64,
    bounded_count: i64,
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    if config.store.backend != "sqlite" {
        println!(
            "Store backend '{}' holds no persistent corpus; nothing to report.",
            config.store.backend
        );
        return Ok(());
    }

    let pool = db::connect(&config.store.path).await?;
    migrate::run_migrations(&pool).await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM snippets")
        .fetch_one(&pool)
        .await?;

    let bounded: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM snippets WHERE date_in_force_from IS NOT NULL OR date_in_force_to IS NOT NULL",
    )
    .fetch_one(&pool)
    .await?;

    let db_size = std::fs::metadata(&config.store.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("AusLex — Corpus Stats");
    println!("=====================");
    println!();
    println!("  Database:        {}", config.store.path.display());
    println!("  Size:            {}", format_bytes(db_size));
    println!();
    println!("  Snippets:        {}", total);
    println!(
        "  In-force dated:  {} / {} ({}%)",
        bounded,
        total,
        if total > 0 { (bounded * 100) / total } else { 0 }
    );

    let rows = sqlx::query(
        r#"
        SELECT jurisdiction,
               COUNT(*) AS snippet_count,
               SUM(CASE WHEN date_in_force_from IS NOT NULL
                         OR date_in_force_to IS NOT NULL THEN 1 ELSE 0 END) AS bounded_count
        FROM snippets
        GROUP BY jurisdiction
        ORDER BY snippet_count DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let breakdown: Vec<JurisdictionStats> = rows
        .iter()
        .map(|row| JurisdictionStats {
            jurisdiction: row.get("jurisdiction"),
            snippet_count: row.get("snippet_count"),
            bounded_count: row.get::<Option<i64>, _>("bounded_count").unwrap_or(0),
        })
        .collect();

    if !breakdown.is_empty() {
        println!();
        println!("  By jurisdiction:");
        println!("  {:<16} {:>8} {:>14}", "JURISDICTION", "SNIPPETS", "DATED");
        println!("  {}", "-".repeat(40));
        for j in &breakdown {
            println!(
                "  {:<16} {:>8} {:>14}",
                j.jurisdiction, j.snippet_count, j.bounded_count
            );
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
