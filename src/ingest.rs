//! Rebuild pipeline orchestration.
//!
//! Coordinates one full rebuild: fetchers → schema normalization → merge
//! with admin edits → [`KnowledgeBase`]. Sources are processed sequentially
//! in registry order so the merge tie-break is deterministic. A failed
//! listing, download or schema check skips only that source and is recorded
//! in the [`RebuildReport`]; the rebuild itself always succeeds.

use anyhow::Result;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::admin::{AdminEditStore, CsvAdminEditStore};
use crate::cache::TtlCache;
use crate::config::Config;
use crate::lookup::KnowledgeBase;
use crate::merge::{merge_sources, DedupPolicy};
use crate::models::{KeywordEntry, RebuildReport, SourceOutcome, SourceReport};
use crate::normalize::normalize_source;
use crate::traits::FetcherRegistry;

const ADMIN_LABEL: &str = "admin";

/// Result of one rebuild cycle.
#[derive(Debug, Clone)]
pub struct Rebuild {
    pub kb: KnowledgeBase,
    pub report: RebuildReport,
}

/// Fetch, normalize, and merge every source, with admin edits applied last.
pub async fn rebuild(
    fetchers: &FetcherRegistry,
    admin: &dyn AdminEditStore,
    policy: DedupPolicy,
) -> Rebuild {
    let mut reports = Vec::new();
    let mut batches: Vec<Vec<KeywordEntry>> = Vec::new();

    for fetcher in fetchers.fetchers() {
        let label = fetcher.label();

        let handles = match fetcher.list().await {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(fetcher = %label, error = %e, "source listing unavailable");
                reports.push(SourceReport {
                    fetcher: label.clone(),
                    name: "(listing)".to_string(),
                    outcome: SourceOutcome::Skipped {
                        reason: e.to_string(),
                    },
                });
                continue;
            }
        };
        tracing::debug!(fetcher = %label, files = handles.len(), "listed sources");

        for handle in &handles {
            let outcome = match fetcher.retrieve(handle).await {
                Ok(raw) => match normalize_source(&raw) {
                    Ok(entries) => {
                        let rows = entries.len();
                        batches.push(entries);
                        SourceOutcome::Loaded { rows }
                    }
                    Err(e) => SourceOutcome::Skipped {
                        reason: e.to_string(),
                    },
                },
                Err(e) => SourceOutcome::Skipped {
                    reason: e.to_string(),
                },
            };

            if let SourceOutcome::Skipped { reason } = &outcome {
                tracing::warn!(fetcher = %label, source = %handle.name, %reason, "skipping source");
            }

            reports.push(SourceReport {
                fetcher: label.clone(),
                name: handle.name.clone(),
                outcome,
            });
        }
    }

    let admin_rows = match admin.load() {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(error = %e, "admin edits unreadable, continuing without them");
            reports.push(SourceReport {
                fetcher: ADMIN_LABEL.to_string(),
                name: "edits".to_string(),
                outcome: SourceOutcome::Skipped {
                    reason: e.to_string(),
                },
            });
            Vec::new()
        }
    };

    let ingested_rows: usize = batches.iter().map(|b| b.len()).sum();
    let admin_count = admin_rows.len();
    let merged = merge_sources(batches, admin_rows, policy);

    let report = RebuildReport {
        sources: reports,
        admin_rows: admin_count,
        ingested_rows,
        entries: merged.len(),
        fingerprint: fingerprint(&merged),
        built_at: Utc::now(),
    };

    tracing::info!(
        entries = report.entries,
        ingested = report.ingested_rows,
        admin = report.admin_rows,
        skipped = report.warnings().len(),
        "knowledge base rebuilt"
    );

    Rebuild {
        kb: KnowledgeBase::new(merged),
        report,
    }
}

/// Rebuild using the fetchers and admin store described by `config`.
pub async fn rebuild_from_config(config: &Config, cache: Arc<TtlCache>) -> Result<Rebuild> {
    let policy = config.merge.policy()?;
    let fetchers = FetcherRegistry::from_config(config, cache)?;
    let admin = CsvAdminEditStore::new(&config.store.admin_edits);
    Ok(rebuild(&fetchers, &admin, policy).await)
}

/// SHA-256 over the consolidated entries, in order.
fn fingerprint(entries: &[KeywordEntry]) -> String {
    let mut hasher = Sha256::new();
    for e in entries {
        hasher.update(e.key.as_bytes());
        hasher.update([0u8]);
        hasher.update(e.description.as_bytes());
        hasher.update([0u8]);
        hasher.update(e.topic.as_bytes());
        hasher.update([b'\n']);
    }
    format!("{:x}", hasher.finalize())
}

/// CLI entry point for `faq rebuild`.
pub async fn run_rebuild(config: &Config) -> Result<()> {
    let cache = Arc::new(TtlCache::disabled());
    let Rebuild { report, .. } = rebuild_from_config(config, cache).await?;
    print_report(&report);
    Ok(())
}

pub fn print_report(report: &RebuildReport) {
    println!("rebuild");
    for s in &report.sources {
        match &s.outcome {
            SourceOutcome::Loaded { rows } => {
                println!("  {:<16} {:<32} {} rows", s.fetcher, s.name, rows)
            }
            SourceOutcome::Skipped { reason } => {
                println!("  {:<16} {:<32} SKIPPED ({})", s.fetcher, s.name, reason)
            }
        }
    }
    println!("  ingested rows: {}", report.ingested_rows);
    println!("  admin edits: {}", report.admin_rows);
    println!("  entries: {}", report.entries);
    println!("  fingerprint: {}", report.fingerprint);
    if report.is_empty() {
        println!("no valid data");
    } else {
        println!("ok");
    }
}
