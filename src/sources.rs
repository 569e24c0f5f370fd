//! Configured source overview for `faq sources`.
//!
//! Reports what the next rebuild will read, in merge order, without
//! contacting remote hosts.

use anyhow::Result;
use serde::Serialize;

use crate::config::Config;

#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    /// Label in `type:name` form, or `admin` for the edit file.
    pub label: String,
    pub location: String,
    pub status: String,
    pub healthy: bool,
}

/// Every configured source, in the order the merge applies them.
pub fn get_sources(config: &Config) -> Vec<SourceStatus> {
    let mut out = Vec::new();

    for (name, remote) in &config.sources.remote {
        let token_missing = remote
            .token_env
            .as_deref()
            .map(|var| std::env::var(var).map(|v| v.is_empty()).unwrap_or(true))
            .unwrap_or(false);
        // A configured but unset token means private listings will 401/404.
        let (status, healthy) = if token_missing {
            ("MISSING (token not set)", false)
        } else {
            ("OK", true)
        };
        out.push(SourceStatus {
            label: format!("remote:{}", name),
            location: remote.listing_url.clone(),
            status: status.to_string(),
            healthy,
        });
    }

    for (name, local) in &config.sources.local {
        let (status, healthy) = if local.root.is_dir() {
            ("OK", true)
        } else {
            ("MISSING (root does not exist)", false)
        };
        out.push(SourceStatus {
            label: format!("local:{}", name),
            location: local.root.display().to_string(),
            status: status.to_string(),
            healthy,
        });
    }

    let admin_exists = config.store.admin_edits.exists();
    out.push(SourceStatus {
        label: "admin".to_string(),
        location: config.store.admin_edits.display().to_string(),
        status: if admin_exists { "OK" } else { "EMPTY" }.to_string(),
        healthy: true,
    });

    out
}

pub fn list_sources(config: &Config) -> Result<()> {
    let sources = get_sources(config);
    println!("{:<20} {:<32} HEALTHY  LOCATION", "SOURCE", "STATUS");
    for s in &sources {
        println!(
            "{:<20} {:<32} {:<8} {}",
            s.label, s.status, s.healthy, s.location
        );
    }
    if sources.len() == 1 {
        println!("no sources configured");
    }
    Ok(())
}
