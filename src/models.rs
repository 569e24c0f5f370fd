//! Core data models used throughout the knowledge base builder.
//!
//! These types represent the raw tables, validated entries, and rebuild
//! summaries that flow through the ingestion and lookup pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column header holding the lookup key.
pub const KEY_COLUMN: &str = "key word";
/// Column header holding the answer text.
pub const DESCRIPTION_COLUMN: &str = "description";
/// Column header holding the category label.
pub const TOPIC_COLUMN: &str = "topic";

/// A validated knowledge base row.
///
/// `key` and `description` are kept exactly as ingested; only the column
/// headers are normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub key: String,
    pub description: String,
    pub topic: String,
}

impl KeywordEntry {
    pub fn new(
        key: impl Into<String>,
        description: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            topic: topic.into(),
        }
    }
}

/// A tabular file discovered by a fetcher but not downloaded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHandle {
    /// File name including extension (e.g. `"cc - Trang tính1.csv"`).
    pub name: String,
    /// Download URL or local path.
    pub location: String,
}

/// Raw tabular data retrieved for one source.
#[derive(Debug, Clone)]
pub struct RawSource {
    pub name: String,
    pub location: String,
    pub body: String,
}

/// Outcome of ingesting a single source during a rebuild.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Loaded { rows: usize },
    Skipped { reason: String },
}

/// Per-source line of a [`RebuildReport`].
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    /// Fetcher label (e.g. `"remote:main"`).
    pub fetcher: String,
    /// Source file name, or `(listing)` when the listing itself failed.
    pub name: String,
    #[serde(flatten)]
    pub outcome: SourceOutcome,
}

/// Summary of one rebuild cycle.
#[derive(Debug, Clone, Serialize)]
pub struct RebuildReport {
    pub sources: Vec<SourceReport>,
    pub admin_rows: usize,
    pub ingested_rows: usize,
    pub entries: usize,
    pub fingerprint: String,
    pub built_at: DateTime<Utc>,
}

impl RebuildReport {
    /// Sources that were skipped, as human-readable warnings.
    pub fn warnings(&self) -> Vec<String> {
        self.sources
            .iter()
            .filter_map(|s| match &s.outcome {
                SourceOutcome::Skipped { reason } => {
                    Some(format!("{} / {}: {}", s.fetcher, s.name, reason))
                }
                SourceOutcome::Loaded { .. } => None,
            })
            .collect()
    }

    /// `true` when the rebuild produced no usable entries.
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}
