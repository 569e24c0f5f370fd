//! Export the consolidated knowledge base as JSON.
//!
//! Produces a single document holding the rebuild report and every entry,
//! suitable for static widgets that want to look keywords up client-side.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::ingest::{rebuild_from_config, Rebuild};
use crate::models::{KeywordEntry, RebuildReport};

#[derive(Serialize)]
struct ExportData<'a> {
    report: &'a RebuildReport,
    topics: Vec<&'a str>,
    entries: &'a [KeywordEntry],
}

/// Serialize a rebuild result to pretty JSON.
pub fn to_json(rebuild: &Rebuild) -> Result<String> {
    let data = ExportData {
        report: &rebuild.report,
        topics: rebuild.kb.list_topics(),
        entries: rebuild.kb.entries(),
    };
    Ok(serde_json::to_string_pretty(&data)?)
}

/// Rebuild and export.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let rebuild = rebuild_from_config(config, Arc::new(TtlCache::disabled())).await?;
    let json = to_json(&rebuild)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)?;
            eprintln!(
                "Exported {} entries in {} topics to {}",
                rebuild.kb.len(),
                rebuild.kb.list_topics().len(),
                path.display()
            );
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}
