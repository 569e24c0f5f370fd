//! CLI query commands: `lookup`, `search`, `suggest`, `topics`, `keywords`, `pins`.
//!
//! Each command runs one rebuild, prints skipped-source warnings on
//! stderr, and prints its answer on stdout.

use anyhow::{bail, Result};
use std::sync::Arc;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::ingest::{rebuild_from_config, Rebuild};
use crate::lookup::KnowledgeBase;
use crate::pins::{JsonPinStore, PinStore};

const NO_DATA: &str = "no valid data";

/// Rebuild for a one-shot query and surface warnings.
async fn load_kb(config: &Config) -> Result<Option<KnowledgeBase>> {
    let Rebuild { kb, report } =
        rebuild_from_config(config, Arc::new(TtlCache::disabled())).await?;
    for w in report.warnings() {
        eprintln!("warning: {}", w);
    }
    if report.is_empty() {
        println!("{}", NO_DATA);
        return Ok(None);
    }
    Ok(Some(kb))
}

pub async fn run_lookup(config: &Config, key: &str) -> Result<()> {
    let Some(kb) = load_kb(config).await? else {
        return Ok(());
    };
    println!("{}", kb.describe(key, &config.lookup.not_found_message));
    Ok(())
}

pub async fn run_search(config: &Config, fragment: &str, topics: &[String]) -> Result<()> {
    let Some(kb) = load_kb(config).await? else {
        return Ok(());
    };

    let results: Vec<_> = kb
        .lookup_contains(fragment)
        .into_iter()
        .filter(|e| topics.is_empty() || topics.contains(&e.topic))
        .collect();

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for e in &results {
        println!("[{}] {}", e.topic, e.key);
        println!("    {}", e.description.replace('\n', "\n    "));
    }
    Ok(())
}

pub async fn run_suggest(config: &Config, text: &str, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(config.lookup.suggest_limit);
    if limit == 0 {
        bail!("--limit must be at least 1");
    }
    let Some(kb) = load_kb(config).await? else {
        return Ok(());
    };

    let suggestions = kb.suggest(text, limit);
    if suggestions.is_empty() {
        println!("No suggestions.");
        return Ok(());
    }
    for s in suggestions {
        println!("{:.3}  {}", s.score, s.key);
    }
    Ok(())
}

pub async fn run_topics(config: &Config) -> Result<()> {
    let Some(kb) = load_kb(config).await? else {
        return Ok(());
    };
    for t in kb.list_topics() {
        println!("{}", t);
    }
    Ok(())
}

pub async fn run_keywords(config: &Config, topic: &str) -> Result<()> {
    let Some(kb) = load_kb(config).await? else {
        return Ok(());
    };
    let keys = kb.list_keywords_for_topic(topic);
    if keys.is_empty() {
        println!("No keywords for topic '{}'.", topic);
    }
    for k in keys {
        println!("{}", k);
    }
    Ok(())
}

/// Pins for `user`, grouped by topic.
pub async fn run_pins(config: &Config, user: &str) -> Result<()> {
    let pins = JsonPinStore::new(&config.store.pins).pins(user)?;
    if pins.is_empty() {
        println!("No pinned keywords.");
        return Ok(());
    }
    let Some(kb) = load_kb(config).await? else {
        return Ok(());
    };
    for (topic, keys) in kb.pinned_by_topic(&pins) {
        println!("{}", topic);
        for k in keys {
            println!("  {}", k);
        }
    }
    Ok(())
}
