//! Remote directory-listing fetcher.
//!
//! Lists a hosted folder through an HTTP endpoint that returns a JSON array
//! of `{ "name", "download_url" }` objects (the GitHub contents API shape),
//! keeps the entries whose extension marks them as tabular, and downloads
//! each one on demand.
//!
//! # Configuration
//!
//! ```toml
//! [sources.remote.main]
//! listing_url = "https://api.github.com/repos/acme/faq-data/contents/sheets"
//! # token_env = "FAQ_GITHUB_TOKEN"   # private repositories
//! ```
//!
//! Entries with a `null` `download_url` are sub-directories and are ignored.
//! Listings and file bodies are cached for `fetch.cache_ttl_secs` so that
//! repeated rebuilds within one interaction burst reuse the same data.
//! Every request is bounded by `fetch.timeout_secs`; a timeout is reported as
//! [`KbError::SourceUnavailable`] like any other transport failure.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::config::{FetchConfig, RemoteSourceConfig};
use crate::error::{KbError, Result};
use crate::models::{RawSource, SourceHandle};
use crate::traits::SourceFetcher;

/// One object in a directory listing response.
#[derive(Debug, Deserialize)]
struct ListingItem {
    name: String,
    #[serde(default)]
    download_url: Option<String>,
}

pub struct RemoteFetcher {
    name: String,
    config: RemoteSourceConfig,
    fetch: FetchConfig,
    cache: Arc<TtlCache>,
    client: reqwest::Client,
}

impl RemoteFetcher {
    pub fn new(
        name: String,
        config: RemoteSourceConfig,
        fetch: FetchConfig,
        cache: Arc<TtlCache>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(fetch.timeout_secs))
            .user_agent(fetch.user_agent.as_str())
            .build()
            .map_err(|e| {
                KbError::unavailable(
                    format!("remote:{}", name),
                    format!("cannot build HTTP client: {}", e),
                )
            })?;
        Ok(Self {
            name,
            config,
            fetch,
            cache,
            client,
        })
    }

    async fn get_text(&self, url: &str, source_name: &str) -> Result<String> {
        if let Some(body) = self.cache.get(url) {
            tracing::debug!(url, "cache hit");
            return Ok(body);
        }

        let mut request = self.client.get(url);
        if let Some(token) = self
            .config
            .token_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
        {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| KbError::unavailable(source_name, describe_transport_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KbError::unavailable(
                source_name,
                format!("HTTP {} from {}", status.as_u16(), url),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| KbError::unavailable(source_name, describe_transport_error(&e)))?;

        self.cache.put(url, body.clone());
        Ok(body)
    }

    fn is_tabular(&self, file_name: &str) -> bool {
        let Some((_, ext)) = file_name.rsplit_once('.') else {
            return false;
        };
        self.fetch
            .extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

#[async_trait]
impl SourceFetcher for RemoteFetcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetcher_type(&self) -> &str {
        "remote"
    }

    async fn list(&self) -> Result<Vec<SourceHandle>> {
        let url = &self.config.listing_url;
        let body = self.get_text(url, url).await?;

        let items: Vec<ListingItem> = serde_json::from_str(&body)
            .map_err(|e| KbError::unavailable(url.as_str(), format!("malformed listing: {}", e)))?;

        let handles = items
            .into_iter()
            .filter(|item| self.is_tabular(&item.name))
            .filter_map(|item| {
                item.download_url.map(|location| SourceHandle {
                    name: item.name,
                    location,
                })
            })
            .collect();

        Ok(handles)
    }

    async fn retrieve(&self, handle: &SourceHandle) -> Result<RawSource> {
        let body = self.get_text(&handle.location, &handle.name).await?;
        Ok(RawSource {
            name: handle.name.clone(),
            location: handle.location.clone(),
            body,
        })
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}
