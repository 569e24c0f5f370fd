//! Local folder fetcher for CSV files uploaded to disk.

use anyhow::anyhow;
use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use crate::config::LocalSourceConfig;
use crate::error::{KbError, Result};
use crate::models::{RawSource, SourceHandle};
use crate::traits::SourceFetcher;

pub struct LocalFetcher {
    name: String,
    config: LocalSourceConfig,
}

impl LocalFetcher {
    pub fn new(name: String, config: LocalSourceConfig) -> Self {
        Self { name, config }
    }
}

#[async_trait]
impl SourceFetcher for LocalFetcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetcher_type(&self) -> &str {
        "local"
    }

    async fn list(&self) -> Result<Vec<SourceHandle>> {
        scan_folder(&self.config)
            .map_err(|e| KbError::unavailable(self.config.root.display().to_string(), e))
    }

    async fn retrieve(&self, handle: &SourceHandle) -> Result<RawSource> {
        let body = tokio::fs::read_to_string(&handle.location)
            .await
            .map_err(|e| KbError::unavailable(handle.name.as_str(), e))?;
        Ok(RawSource {
            name: handle.name.clone(),
            location: handle.location.clone(),
            body,
        })
    }
}

/// Walk the configured root and return matching files sorted by relative path.
pub fn scan_folder(config: &LocalSourceConfig) -> anyhow::Result<Vec<SourceHandle>> {
    let root = &config.root;
    if !root.exists() {
        return Err(anyhow!("root does not exist: {}", root.display()));
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec!["**/.git/**".to_string()];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut found: Vec<(String, SourceHandle)> = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }
        if !include_set.is_match(&rel_str) {
            continue;
        }

        found.push((rel_str, handle_for(path)));
    }

    // Sort for deterministic merge order
    found.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(found.into_iter().map(|(_, h)| h).collect())
}

fn handle_for(path: &Path) -> SourceHandle {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    SourceHandle {
        name,
        location: path.display().to_string(),
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config(root: &Path) -> LocalSourceConfig {
        LocalSourceConfig {
            root: root.to_path_buf(),
            include_globs: vec!["**/*.csv".to_string()],
            exclude_globs: vec!["archive/**".to_string()],
        }
    }

    #[test]
    fn lists_csv_files_in_path_order() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.csv"), "key word,description\n").unwrap();
        fs::write(tmp.path().join("a.csv"), "key word,description\n").unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir_all(tmp.path().join("archive")).unwrap();
        fs::write(tmp.path().join("archive/old.csv"), "key word,description\n").unwrap();

        let handles = scan_folder(&config(tmp.path())).unwrap();
        let names: Vec<&str> = handles.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(scan_folder(&config(&tmp.path().join("nope"))).is_err());
    }

    #[tokio::test]
    async fn retrieve_reads_body() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.csv"), "key word,description\nx,y\n").unwrap();
        let fetcher = LocalFetcher::new("uploads".to_string(), config(tmp.path()));

        let handles = fetcher.list().await.unwrap();
        let raw = fetcher.retrieve(&handles[0]).await.unwrap();
        assert_eq!(raw.name, "a.csv");
        assert!(raw.body.contains("x,y"));
        assert_eq!(fetcher.label(), "local:uploads");
    }
}
