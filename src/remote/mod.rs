//! Remote search collaborators.
//!
//! This module defines the records exchanged with the paged-search API
//! (stage 1) and the per-item detail API (stage 2), and the backend trait the
//! pipeline fetches through.

pub mod error;
pub mod github;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::query::QuerySpec;

pub use github::GitHubBackend;

/// Minimal identity of one search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    /// Handle used to address the detail endpoint
    pub login: String,
    #[serde(default)]
    pub id: u64,
    /// Detail URL as reported by the search API
    #[serde(default)]
    pub url: String,
}

impl ItemRef {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            id: 0,
            url: String::new(),
        }
    }
}

/// One page of stage-1 search results
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchPage {
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<ItemRef>,
}

/// Full detail record for one item, as displayed in a result row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRow {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub location: Option<String>,
    /// External profile page
    #[serde(default)]
    pub html_url: String,
}

impl EnrichedRow {
    /// Link opened when the row is activated.
    pub fn profile_url(&self) -> Option<&str> {
        if self.html_url.is_empty() {
            None
        } else {
            Some(&self.html_url)
        }
    }

    /// Display name, falling back to the login handle.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.login)
    }
}

/// Common interface for remote search backends
pub trait SearchBackend: Send + Sync {
    /// Stage 1: fetch one page of item references for a query
    fn search(&self, spec: &QuerySpec) -> impl Future<Output = Result<SearchPage>> + Send;

    /// Stage 2: fetch the full detail record for one item
    fn fetch_detail(&self, item: &ItemRef) -> impl Future<Output = Result<EnrichedRow>> + Send;
}
