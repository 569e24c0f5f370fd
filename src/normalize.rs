//! Schema normalization for raw CSV tables.
//!
//! Headers are trimmed and lower-cased, the required `key word` and
//! `description` columns are located, and every row is turned into a
//! [`KeywordEntry`]. Cell values are never case-folded: deduplication and
//! exact lookup see keys exactly as they were typed.

use std::path::Path;

use crate::error::{KbError, Result};
use crate::models::{KeywordEntry, RawSource, DESCRIPTION_COLUMN, KEY_COLUMN, TOPIC_COLUMN};

/// Where each row's topic comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicRule<'a> {
    /// Every row gets this topic (the source file name without extension).
    Fixed(&'a str),
    /// Rows carry their own `topic` column, which is then required.
    Column,
}

/// Derive a topic label from a source file name: `"hb - Sheet1.csv"` → `"hb - Sheet1"`.
pub fn topic_from_name(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string())
}

/// Normalize a fetched source, tagging rows with the source-derived topic.
pub fn normalize_source(raw: &RawSource) -> Result<Vec<KeywordEntry>> {
    let topic = topic_from_name(&raw.name);
    parse_table(&raw.name, &raw.body, TopicRule::Fixed(&topic))
}

/// Parse a CSV body into entries.
///
/// Fails with [`KbError::SchemaMismatch`] when a required column is absent.
/// Rows with a blank key or description are dropped.
pub fn parse_table(source_name: &str, body: &str, topic: TopicRule<'_>) -> Result<Vec<KeywordEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(normalize_header)
        .collect();

    let key_idx = headers.iter().position(|h| h == KEY_COLUMN);
    let desc_idx = headers.iter().position(|h| h == DESCRIPTION_COLUMN);
    let topic_idx = match topic {
        TopicRule::Column => headers.iter().position(|h| h == TOPIC_COLUMN),
        TopicRule::Fixed(_) => None,
    };

    let mut missing = Vec::new();
    if key_idx.is_none() {
        missing.push(KEY_COLUMN.to_string());
    }
    if desc_idx.is_none() {
        missing.push(DESCRIPTION_COLUMN.to_string());
    }
    if topic == TopicRule::Column && topic_idx.is_none() {
        missing.push(TOPIC_COLUMN.to_string());
    }
    let (Some(key_idx), Some(desc_idx)) = (key_idx, desc_idx) else {
        return Err(KbError::SchemaMismatch {
            source_name: source_name.to_string(),
            missing,
        });
    };
    if !missing.is_empty() {
        return Err(KbError::SchemaMismatch {
            source_name: source_name.to_string(),
            missing,
        });
    }

    let mut entries = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let key = record.get(key_idx).unwrap_or_default();
        let description = record.get(desc_idx).unwrap_or_default();
        if key.trim().is_empty() || description.trim().is_empty() {
            tracing::debug!(source = source_name, row = line + 1, "dropping row with blank key or description");
            continue;
        }

        let row_topic = match topic {
            TopicRule::Fixed(t) => t.to_string(),
            TopicRule::Column => topic_idx
                .and_then(|i| record.get(i))
                .unwrap_or_default()
                .to_string(),
        };

        entries.push(KeywordEntry::new(key, description, row_topic));
    }

    Ok(entries)
}

fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_lowercase()
}
