//! Extension trait for tabular sources.
//!
//! Every source of CSV tables (remote directory listings, local upload
//! folders, or custom fetchers written in Rust) implements [`SourceFetcher`]
//! and is registered in a [`FetcherRegistry`]. The registry order is the
//! merge order: later fetchers win key collisions.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │             FetcherRegistry              │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐  │
//! │  │ remote:* │ │ local:*  │ │ custom   │  │
//! │  └──────────┘ └──────────┘ └──────────┘  │
//! └──────────────┬───────────────────────────┘
//!                ▼
//!         rebuild() → normalize → merge
//! ```
//!
//! # Usage
//!
//! ```rust
//! use async_trait::async_trait;
//! use faq_harness::error::Result;
//! use faq_harness::models::{RawSource, SourceHandle};
//! use faq_harness::traits::{FetcherRegistry, SourceFetcher};
//!
//! struct Inline;
//!
//! #[async_trait]
//! impl SourceFetcher for Inline {
//!     fn name(&self) -> &str { "inline" }
//!
//!     async fn list(&self) -> Result<Vec<SourceHandle>> {
//!         Ok(vec![SourceHandle { name: "faq.csv".into(), location: "inline".into() }])
//!     }
//!
//!     async fn retrieve(&self, handle: &SourceHandle) -> Result<RawSource> {
//!         Ok(RawSource {
//!             name: handle.name.clone(),
//!             location: handle.location.clone(),
//!             body: "key word,description\nhours,9 to 5\n".into(),
//!         })
//!     }
//! }
//!
//! let mut fetchers = FetcherRegistry::new();
//! fetchers.register(Box::new(Inline));
//! assert_eq!(fetchers.len(), 1);
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::Result;
use crate::models::{RawSource, SourceHandle};

/// A location that can list and retrieve tabular files.
///
/// [`list`](SourceFetcher::list) failing means the whole location is
/// unavailable; [`retrieve`](SourceFetcher::retrieve) failing skips only
/// that file. Neither aborts a rebuild.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Instance name (e.g. `"main"`).
    fn name(&self) -> &str;

    /// Fetcher type (e.g. `"remote"`, `"local"`).
    fn fetcher_type(&self) -> &str {
        "custom"
    }

    /// Label used in reports and logs: `"{type}:{name}"`.
    fn label(&self) -> String {
        format!("{}:{}", self.fetcher_type(), self.name())
    }

    /// Discover the tabular files at this location, in merge order.
    async fn list(&self) -> Result<Vec<SourceHandle>>;

    /// Download or read one discovered file.
    async fn retrieve(&self, handle: &SourceHandle) -> Result<RawSource>;
}

/// Ordered collection of fetchers.
#[derive(Default)]
pub struct FetcherRegistry {
    fetchers: Vec<Box<dyn SourceFetcher>>,
}

impl FetcherRegistry {
    pub fn new() -> Self {
        Self {
            fetchers: Vec::new(),
        }
    }

    /// Remote instances first, then local ones, each group in name order.
    /// Fails if a remote fetcher's HTTP client cannot be built.
    pub fn from_config(config: &Config, cache: Arc<TtlCache>) -> Result<Self> {
        use crate::connector_fs::LocalFetcher;
        use crate::connector_remote::RemoteFetcher;

        let mut registry = Self::new();
        for (name, cfg) in &config.sources.remote {
            registry.register(Box::new(RemoteFetcher::new(
                name.clone(),
                cfg.clone(),
                config.fetch.clone(),
                cache.clone(),
            )?));
        }
        for (name, cfg) in &config.sources.local {
            registry.register(Box::new(LocalFetcher::new(name.clone(), cfg.clone())));
        }
        Ok(registry)
    }

    pub fn register(&mut self, fetcher: Box<dyn SourceFetcher>) {
        self.fetchers.push(fetcher);
    }

    pub fn fetchers(&self) -> &[Box<dyn SourceFetcher>] {
        &self.fetchers
    }

    pub fn len(&self) -> usize {
        self.fetchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fetchers.is_empty()
    }
}
