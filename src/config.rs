use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::merge::{DedupPolicy, DescriptionPolicy, KeyPolicy};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_admin_edits")]
    pub admin_edits: PathBuf,
    #[serde(default = "default_pins")]
    pub pins: PathBuf,
    #[serde(default = "default_preferences")]
    pub preferences: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            admin_edits: default_admin_edits(),
            pins: default_pins(),
            preferences: default_preferences(),
        }
    }
}

fn default_admin_edits() -> PathBuf {
    PathBuf::from("data/admin_edits.csv")
}
fn default_pins() -> PathBuf {
    PathBuf::from("data/pinned_keywords.json")
}
fn default_preferences() -> PathBuf {
    PathBuf::from("data/theme_prefs.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Most listing and file bodies kept in memory at once.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
            extensions: default_extensions(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_cache_ttl_secs() -> u64 {
    60
}
fn default_cache_capacity() -> usize {
    256
}
fn default_extensions() -> Vec<String> {
    vec!["csv".to_string()]
}
fn default_user_agent() -> String {
    format!("faq-harness/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Deserialize, Clone)]
pub struct MergeConfig {
    #[serde(default = "default_key_policy")]
    pub key_policy: String,
    #[serde(default = "default_description_policy")]
    pub description_policy: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            key_policy: default_key_policy(),
            description_policy: default_description_policy(),
        }
    }
}

fn default_key_policy() -> String {
    "last".to_string()
}
fn default_description_policy() -> String {
    "first".to_string()
}

impl MergeConfig {
    pub fn policy(&self) -> Result<DedupPolicy> {
        let key = match self.key_policy.as_str() {
            "last" => KeyPolicy::LastWins,
            "first" => KeyPolicy::FirstWins,
            other => anyhow::bail!(
                "Unknown merge.key_policy: '{}'. Must be last or first.",
                other
            ),
        };
        let description = match self.description_policy.as_str() {
            "first" => DescriptionPolicy::FirstWins,
            "last" => DescriptionPolicy::LastWins,
            "keep_all" => DescriptionPolicy::KeepAll,
            other => anyhow::bail!(
                "Unknown merge.description_policy: '{}'. Must be first, last, or keep_all.",
                other
            ),
        };
        Ok(DedupPolicy { key, description })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LookupConfig {
    #[serde(default = "default_not_found_message")]
    pub not_found_message: String,
    #[serde(default = "default_suggest_limit")]
    pub suggest_limit: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            not_found_message: default_not_found_message(),
            suggest_limit: default_suggest_limit(),
        }
    }
}

fn default_not_found_message() -> String {
    "No data available. If you want to add, please type 'add'.".to_string()
}
fn default_suggest_limit() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    /// Environment variable holding the admin token.
    #[serde(default = "default_admin_token_env")]
    pub token_env: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            token_env: default_admin_token_env(),
        }
    }
}

fn default_admin_token_env() -> String {
    "FAQ_ADMIN_TOKEN".to_string()
}

impl AdminConfig {
    /// Whether `presented` grants the admin capability. No token configured
    /// means nobody is admin.
    pub fn is_admin(&self, presented: Option<&str>) -> bool {
        match (std::env::var(&self.token_env).ok(), presented) {
            (Some(expected), Some(given)) => !expected.is_empty() && expected == given,
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

/// Named source instances. `BTreeMap` keeps the merge order stable.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourcesConfig {
    #[serde(default)]
    pub remote: BTreeMap<String, RemoteSourceConfig>,
    #[serde(default)]
    pub local: BTreeMap<String, LocalSourceConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteSourceConfig {
    /// Directory-listing endpoint returning `[{name, download_url}]`.
    pub listing_url: String,
    /// Environment variable holding a bearer token, for private listings.
    #[serde(default)]
    pub token_env: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocalSourceConfig {
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.csv".to_string()]
}

impl Config {
    /// Defaults only: no sources, stores under `./data`.
    pub fn minimal() -> Self {
        Self {
            store: StoreConfig::default(),
            fetch: FetchConfig::default(),
            merge: MergeConfig::default(),
            lookup: LookupConfig::default(),
            admin: AdminConfig::default(),
            server: ServerConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.fetch.timeout_secs == 0 {
        anyhow::bail!("fetch.timeout_secs must be > 0");
    }

    if config.fetch.cache_capacity == 0 {
        anyhow::bail!("fetch.cache_capacity must be >= 1");
    }

    if reqwest::header::HeaderValue::from_str(&config.fetch.user_agent).is_err() {
        anyhow::bail!(
            "fetch.user_agent is not a valid header value: {:?}",
            config.fetch.user_agent
        );
    }

    if config.fetch.extensions.is_empty() {
        anyhow::bail!("fetch.extensions must list at least one extension");
    }

    if config.lookup.suggest_limit == 0 {
        anyhow::bail!("lookup.suggest_limit must be >= 1");
    }

    config.merge.policy()?;

    for (name, remote) in &config.sources.remote {
        if !remote.listing_url.starts_with("http://") && !remote.listing_url.starts_with("https://")
        {
            anyhow::bail!(
                "sources.remote.{}.listing_url must be an http(s) URL, got '{}'",
                name,
                remote.listing_url
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.fetch.cache_ttl_secs, 60);
        assert_eq!(config.fetch.cache_capacity, 256);
        assert_eq!(config.fetch.extensions, vec!["csv"]);
        assert_eq!(config.server.bind, "127.0.0.1:8501");
        let policy = config.merge.policy().unwrap();
        assert_eq!(policy, DedupPolicy::default());
    }

    #[test]
    fn named_sources_parse_in_name_order() {
        let config = parse(
            r#"
[sources.remote.zeta]
listing_url = "https://example.com/z"

[sources.remote.alpha]
listing_url = "https://example.com/a"

[sources.local.uploads]
root = "data/uploads"
"#,
        )
        .unwrap();
        let names: Vec<&str> = config.sources.remote.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(
            config.sources.local["uploads"].include_globs,
            vec!["**/*.csv"]
        );
    }

    #[test]
    fn example_config_is_valid() {
        let config = parse(include_str!("../config/faq.example.toml")).unwrap();
        assert!(config.sources.remote.contains_key("main"));
        assert_eq!(config.sources.local["uploads"].exclude_globs, vec!["archive/**"]);
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = parse("[merge]\nkey_policy = \"random\"\n").unwrap_err();
        assert!(err.to_string().contains("key_policy"));
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(parse("[fetch]\ntimeout_secs = 0\n").is_err());
    }

    #[test]
    fn rejects_user_agent_with_control_chars() {
        let err = parse("[fetch]\nuser_agent = \"faq\\nharness\"\n").unwrap_err();
        assert!(err.to_string().contains("user_agent"));
    }

    #[test]
    fn rejects_zero_cache_capacity() {
        let err = parse("[fetch]\ncache_capacity = 0\n").unwrap_err();
        assert!(err.to_string().contains("cache_capacity"));
    }

    #[test]
    fn rejects_non_http_listing() {
        let err = parse("[sources.remote.x]\nlisting_url = \"ftp://host/dir\"\n").unwrap_err();
        assert!(err.to_string().contains("listing_url"));
    }

    #[test]
    fn admin_without_token_env_denies() {
        let admin = AdminConfig {
            token_env: "FAQ_HARNESS_TEST_UNSET_TOKEN".to_string(),
        };
        assert!(!admin.is_admin(Some("anything")));
        assert!(!admin.is_admin(None));
    }
}
