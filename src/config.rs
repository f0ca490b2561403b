//! Configuration for the workspace core.
//!
//! Loaded from a TOML file with environment overrides for the index host and
//! API key, so deployments can point the same build at different indexes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub fileserver: FileServerConfig,
    /// Primary UI language; language-suffixed index fields (genre, type,
    /// tags) default to this when a request does not name one.
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_host")]
    pub host: String,
    pub api_key: Option<String>,
    #[serde(default = "default_index_uid")]
    pub index_uid: String,
    /// Origin the UI is served from (e.g. "https://app.example.org"). When
    /// this is https and `host` is plain http, queries are refused before
    /// any network I/O.
    pub app_origin: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(default = "default_fileserver_url")]
    pub url: String,
    /// Saves carry full page text, so they get a longer budget.
    #[serde(default = "default_save_timeout")]
    pub save_timeout_secs: u64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Cap on the non-distinct relevance scan before client-side dedup.
    #[serde(default = "default_relevance_scan")]
    pub relevance_scan: usize,
    /// Work ids per batched representative-page query; bounds filter
    /// expression length.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Upper bound on pages fetched for one work's status rollup.
    #[serde(default = "default_max_pages_per_work")]
    pub max_pages_per_work: usize,
}

fn default_language() -> String {
    "et".to_string()
}

fn default_index_host() -> String {
    "http://127.0.0.1:7700".to_string()
}

fn default_index_uid() -> String {
    "pages".to_string()
}

fn default_fileserver_url() -> String {
    "http://127.0.0.1:8600".to_string()
}

fn default_save_timeout() -> u64 {
    30
}

fn default_timeout() -> u64 {
    10
}

fn default_relevance_scan() -> usize {
    1000
}

fn default_batch_size() -> usize {
    40
}

fn default_max_pages_per_work() -> usize {
    2000
}

// Derived Default would leave `language` empty; the serde default fns are
// the single source of truth for both construction paths.
impl Default for Config {
    fn default() -> Self {
        Self {
            index: IndexConfig::default(),
            fileserver: FileServerConfig::default(),
            language: default_language(),
            limits: LimitsConfig::default(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            host: default_index_host(),
            api_key: None,
            index_uid: default_index_uid(),
            app_origin: None,
        }
    }
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            url: default_fileserver_url(),
            save_timeout_secs: default_save_timeout(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            relevance_scan: default_relevance_scan(),
            batch_size: default_batch_size(),
            max_pages_per_work: default_max_pages_per_work(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut config: Config =
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("SCRIPTORIUM_INDEX_HOST") {
            self.index.host = host;
        }
        if let Ok(key) = std::env::var("SCRIPTORIUM_INDEX_API_KEY") {
            self.index.api_key = Some(key);
        }
    }
}
