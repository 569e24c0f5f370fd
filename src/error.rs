//! Error taxonomy for ingestion, lookup, and admin edits.
//!
//! Ingestion errors (`SourceUnavailable`, `SchemaMismatch`) are isolated per
//! source by the rebuild pipeline. `Validation` and `Unauthorized` reject an
//! admin mutation before anything is written.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KbError {
    /// Listing or downloading a source failed (network, timeout, HTTP status).
    #[error("source unavailable: {source_name}: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// A fetched table lacks one of the required columns.
    #[error("schema mismatch in {source_name}: missing column(s) {}", .missing.join(", "))]
    SchemaMismatch {
        source_name: String,
        missing: Vec<String>,
    },

    /// An admin submission is missing required fields.
    #[error("invalid entry: missing {}", .missing.join(", "))]
    Validation { missing: Vec<String> },

    /// The caller lacks the admin capability.
    #[error("admin access required")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    /// An in-memory store was left inconsistent by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KbError {
    pub(crate) fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        KbError::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for KbError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        KbError::LockPoisoned
    }
}

pub type Result<T> = std::result::Result<T, KbError>;
