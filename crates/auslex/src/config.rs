//! TOML configuration parsing and validation.
//!
//! All settings live in one TOML file (default: `config/auslex.toml`).
//! Sections: `[store]` (backend and SQLite path), `[retrieval]` (limit,
//! over-fetch, ranking penalty), `[embedding]` (provider and model),
//! `[server]` (bind address). Every section has working defaults so a
//! minimal config file is valid.

use anyhow::{Context, Result};
use auslex_core::retriever::RetrieverOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// `"sqlite"` (durable) or `"memory"` (per-process, for ephemeral
    /// runs). Chosen at construction time — there is no fallback from
    /// one backend to the other.
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_db_path(),
        }
    }
}

fn default_backend() -> String {
    "sqlite".to_string()
}
fn default_db_path() -> PathBuf {
    PathBuf::from("data/auslex.sqlite")
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Results returned when a query has no explicit limit.
    #[serde(default = "default_limit")]
    pub default_limit: i64,
    /// Candidate over-fetch multiplier; headroom for filter attrition.
    #[serde(default = "default_overfetch_factor")]
    pub overfetch_factor: usize,
    /// Ranking penalty for snippets with no in-force bounds under an
    /// as-at query.
    #[serde(default = "default_unbounded_penalty")]
    pub unbounded_penalty: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            overfetch_factor: default_overfetch_factor(),
            unbounded_penalty: default_unbounded_penalty(),
        }
    }
}

fn default_limit() -> i64 {
    8
}
fn default_overfetch_factor() -> usize {
    2
}
fn default_unbounded_penalty() -> f64 {
    0.05
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `"disabled"`, `"openai"`, or `"ollama"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Provider base URL (Ollama only; default `http://localhost:11434`).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
        }
    }
}

impl Config {
    /// Retrieval knobs in the shape the core retriever takes.
    pub fn retriever_options(&self) -> RetrieverOptions {
        RetrieverOptions {
            default_limit: self.retrieval.default_limit as usize,
            overfetch_factor: self.retrieval.overfetch_factor,
            unbounded_penalty: self.retrieval.unbounded_penalty,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    match config.store.backend.as_str() {
        "sqlite" | "memory" => {}
        other => anyhow::bail!(
            "Unknown store backend: '{}'. Must be sqlite or memory.",
            other
        ),
    }

    if config.retrieval.default_limit < 1 {
        anyhow::bail!("retrieval.default_limit must be >= 1");
    }
    if config.retrieval.overfetch_factor < 1 {
        anyhow::bail!("retrieval.overfetch_factor must be >= 1");
    }
    if config.retrieval.unbounded_penalty < 0.0 {
        anyhow::bail!("retrieval.unbounded_penalty must be >= 0");
    }

    if config.embedding.is_enabled() {
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }

    Ok(config)
}
