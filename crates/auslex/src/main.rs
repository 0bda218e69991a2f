//! # AusLex CLI (`auslex`)
//!
//! Command-line interface for the AusLex retrieval service.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `auslex init` | Create the SQLite database and run schema migrations |
//! | `auslex ingest <file>` | Embed and upsert a JSONL snippet corpus |
//! | `auslex search "<query>"` | Retrieve ranked snippets for a legal question |
//! | `auslex stats` | Show corpus statistics |
//! | `auslex serve` | Start the HTTP search endpoint |
//!
//! ## Examples
//!
//! ```bash
//! auslex init --config ./config/auslex.toml
//! auslex ingest demos/corpus.jsonl
//! auslex search "What is the character test under s 501?" --jurisdiction Cth
//! auslex search "unfair dismissal" --as-at 2010-06-30 --limit 5
//! auslex serve
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use auslex::{config, db, ingest, migrate, search, server, stats};

/// AusLex — embedding-backed retrieval over Australian legal snippets
/// with jurisdiction and point-in-time filtering.
#[derive(Parser)]
#[command(
    name = "auslex",
    about = "AusLex — legal snippet retrieval with jurisdiction and as-at filtering",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/auslex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the snippets table.
    /// Idempotent — running it multiple times is safe.
    Init,

    /// Embed and upsert a snippet corpus.
    ///
    /// Reads one JSON snippet per line, embeds each batch via the
    /// configured provider, and upserts snippets with their vectors.
    /// Re-ingesting a file replaces snippets with matching ids.
    Ingest {
        /// Path to a JSONL corpus file.
        file: PathBuf,
    },

    /// Retrieve ranked snippets for a legal question.
    Search {
        /// Free-text legal question.
        query: String,

        /// Restrict results to a jurisdiction code (case-insensitive
        /// substring match, e.g. `Cth`, `NSW`).
        #[arg(long)]
        jurisdiction: Option<String>,

        /// Only return snippets in force on this date (YYYY-MM-DD).
        #[arg(long)]
        as_at: Option<String>,

        /// Maximum number of results to return (default 8).
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Show corpus statistics.
    Stats,

    /// Start the HTTP search endpoint.
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            if config.store.backend != "sqlite" {
                println!(
                    "Store backend '{}' needs no initialization.",
                    config.store.backend
                );
                return Ok(());
            }
            let pool = db::connect(&config.store.path).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized at {}", config.store.path.display());
            Ok(())
        }
        Commands::Ingest { file } => ingest::run_ingest(&config, &file).await,
        Commands::Search {
            query,
            jurisdiction,
            as_at,
            limit,
        } => search::run_search(&config, &query, jurisdiction, as_at, limit).await,
        Commands::Stats => stats::run_stats(&config).await,
        Commands::Serve => server::run_server(&config).await,
    }
}
