//! Configuration for the search pipeline.
//!
//! Configuration is stored as YAML and includes:
//! - The remote API location and HTTP client settings
//! - Trigger shaping (minimum query length, debounce window, page size)
//! - How fetch failures are classified

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SearchError};
use crate::pipeline::classify::FailurePolicy;
use crate::query::{PageRequest, SortSpec};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

/// Remote API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the API, without trailing path
    pub base_url: String,
    /// Searched resource, e.g. `users` for `/search/users` and `/users/{id}`
    pub resource: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            resource: "users".to_string(),
            user_agent: concat!("hubsearch/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 60,
            connect_timeout_secs: 30,
        }
    }
}

/// Trigger shaping and paging defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Inputs of this many characters or fewer never reach the API
    pub min_query_len: usize,
    /// Quiet period after the last keystroke before a search is issued
    pub debounce_ms: u64,
    pub page_size: u32,
    pub sort: SortSpec,
    /// Maximum number of detail requests in flight for one page; unset
    /// requests the whole page at once
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_concurrency: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_len: 2,
            debounce_ms: 1000,
            page_size: 30,
            sort: SortSpec::default(),
            detail_concurrency: None,
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn initial_page(&self) -> Result<PageRequest> {
        PageRequest::first(self.page_size)
    }
}

impl Config {
    /// Load configuration from file, or return default if not found
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.api_base_url()?;
        if self.api.resource.trim().is_empty() {
            return Err(SearchError::Config("api.resource cannot be empty".to_string()));
        }
        if self.search.page_size == 0 {
            return Err(SearchError::Config(
                "search.page_size must be greater than zero".to_string(),
            ));
        }
        if self.search.detail_concurrency == Some(0) {
            return Err(SearchError::Config(
                "search.detail_concurrency must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn api_base_url(&self) -> Result<Url> {
        Url::parse(&self.api.base_url).map_err(|e| {
            SearchError::Config(format!("invalid api.base_url '{}': {}", self.api.base_url, e))
        })
    }
}
