//! Core data models for the AusLex retrieval pipeline.
//!
//! A [`Snippet`] is an immutable unit of retrievable legal text plus the
//! citation and in-force metadata needed for jurisdiction and
//! point-in-time ("as-at") filtering. Snippets are created by an external
//! ingestion process and mutated only by re-upsert; there is no partial
//! field update.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Category of legal source a snippet was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Legislation,
    Regulation,
    Case,
    Guideline,
    #[default]
    Other,
}

impl SourceType {
    /// Stable string form used for storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Legislation => "legislation",
            SourceType::Regulation => "regulation",
            SourceType::Case => "case",
            SourceType::Guideline => "guideline",
            SourceType::Other => "other",
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legislation" => Ok(SourceType::Legislation),
            "regulation" => Ok(SourceType::Regulation),
            "case" => Ok(SourceType::Case),
            "guideline" => Ok(SourceType::Guideline),
            "other" => Ok(SourceType::Other),
            _ => anyhow::bail!("Unknown source type: '{}'", s),
        }
    }
}

/// Citation and in-force metadata attached to a [`Snippet`].
///
/// Only `jurisdiction` and the two in-force dates participate in
/// filtering and ranking; the remaining fields are display-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnippetMetadata {
    /// Jurisdiction code (e.g. `"Cth"`, `"NSW"`, a court code).
    /// Matched case-insensitively by substring.
    pub jurisdiction: String,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub citation: Option<String>,
    #[serde(default)]
    pub provision: Option<String>,
    #[serde(default)]
    pub paragraph: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// First date on which this snippet accurately reflects the law.
    #[serde(default)]
    pub date_in_force_from: Option<NaiveDate>,
    /// Last date on which this snippet accurately reflects the law.
    /// `None` means "still in force".
    #[serde(default)]
    pub date_in_force_to: Option<NaiveDate>,
}

impl SnippetMetadata {
    /// Whether this snippet was in force on `as_at`.
    ///
    /// A snippet with no in-force bounds at all is treated as always in
    /// force. When bounds are present, each absent side is open-ended.
    pub fn in_force_at(&self, as_at: NaiveDate) -> bool {
        if self.date_in_force_from.is_none() && self.date_in_force_to.is_none() {
            return true;
        }
        let from_ok = self.date_in_force_from.map_or(true, |from| from <= as_at);
        let to_ok = self.date_in_force_to.map_or(true, |to| as_at <= to);
        from_ok && to_ok
    }

    /// Whether this snippet carries any explicit in-force bounds.
    pub fn has_force_bounds(&self) -> bool {
        self.date_in_force_from.is_some() || self.date_in_force_to.is_some()
    }

    /// Case-insensitive substring match against the requested
    /// jurisdiction.
    ///
    /// Substring (not equality) so that a broad code still matches more
    /// specific regional variants recorded in the corpus.
    pub fn matches_jurisdiction(&self, requested: &str) -> bool {
        self.jurisdiction
            .to_lowercase()
            .contains(&requested.to_lowercase())
    }
}

/// A retrievable excerpt of legal text plus citation metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snippet {
    /// Stable unique identifier.
    pub id: String,
    /// Raw snippet content: a paragraph, section excerpt, or holding.
    pub text: String,
    #[serde(default)]
    pub metadata: SnippetMetadata,
}

/// A single retrieval request.
///
/// `as_at` stays a raw string here: parsing happens inside the
/// retriever so an unparseable value is rejected rather than silently
/// defaulting to "now".
#[derive(Debug, Clone, Deserialize)]
pub struct SnippetQuery {
    /// Free-text legal question.
    #[serde(alias = "question")]
    pub query: String,
    /// Restrict results to this jurisdiction (substring match).
    #[serde(default)]
    pub jurisdiction: Option<String>,
    /// Point-in-time reference date, ISO `YYYY-MM-DD`.
    #[serde(default)]
    pub as_at: Option<String>,
    /// Maximum results to return. Defaults to 8 when absent.
    #[serde(default)]
    pub limit: Option<i64>,
}
