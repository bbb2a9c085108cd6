//! Shared fixtures for pipeline integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use hubsearch::remote::error::ApiError;
use hubsearch::{EnrichedRow, ItemRef, QuerySpec, Result, SearchBackend, SearchPage};
use parking_lot::Mutex;
use reqwest::StatusCode;
use tokio::time::Instant;

pub const SEARCH_DELAY_MS: u64 = 100;
pub const DETAIL_DELAY_MS: u64 = 50;

/// A request observed by [`FakeBackend`], with its offset from backend creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Search {
        text: String,
        sort_key: String,
        page: u32,
        per_page: u32,
        at: Duration,
    },
    Detail {
        login: String,
        at: Duration,
    },
}

/// Scriptable in-memory search backend.
///
/// Pages are keyed by query text and 0-based page index. Latencies are
/// simulated with tokio timers so tests can run on a paused clock.
pub struct FakeBackend {
    pages: HashMap<(String, u32), SearchPage>,
    search_delays: HashMap<(String, u32), u64>,
    failing_searches: HashMap<String, StatusCode>,
    detail_delays: HashMap<String, u64>,
    failing_details: HashMap<String, StatusCode>,
    calls: Mutex<Vec<Call>>,
    created: Instant,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            search_delays: HashMap::new(),
            failing_searches: HashMap::new(),
            detail_delays: HashMap::new(),
            failing_details: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            created: Instant::now(),
        }
    }

    pub fn with_page(mut self, text: &str, page_index: u32, total: u64, logins: &[&str]) -> Self {
        let items = logins.iter().map(|login| ItemRef::new(*login)).collect();
        self.pages.insert(
            (text.to_string(), page_index),
            SearchPage {
                total_count: total,
                items,
            },
        );
        self
    }

    pub fn with_search_delay(mut self, text: &str, page_index: u32, ms: u64) -> Self {
        self.search_delays.insert((text.to_string(), page_index), ms);
        self
    }

    pub fn failing_search(mut self, text: &str, status: StatusCode) -> Self {
        self.failing_searches.insert(text.to_string(), status);
        self
    }

    pub fn with_detail_delay(mut self, login: &str, ms: u64) -> Self {
        self.detail_delays.insert(login.to_string(), ms);
        self
    }

    pub fn failing_detail(mut self, login: &str, status: StatusCode) -> Self {
        self.failing_details.insert(login.to_string(), status);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn search_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Search { .. }))
            .collect()
    }

    pub fn detail_logins(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Detail { login, .. } => Some(login),
                Call::Search { .. } => None,
            })
            .collect()
    }

    fn elapsed(&self) -> Duration {
        self.created.elapsed()
    }
}

impl SearchBackend for FakeBackend {
    async fn search(&self, spec: &QuerySpec) -> Result<SearchPage> {
        self.calls.lock().push(Call::Search {
            text: spec.text().to_string(),
            sort_key: spec.sort_key().to_string(),
            page: spec.search_page_number(),
            per_page: spec.page_size(),
            at: self.elapsed(),
        });

        let key = (spec.text().to_string(), spec.page_index());
        let delay = self
            .search_delays
            .get(&key)
            .copied()
            .unwrap_or(SEARCH_DELAY_MS);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        if let Some(status) = self.failing_searches.get(spec.text()) {
            return Err(ApiError::with_status("search failed", "Fake", *status).into());
        }
        Ok(self.pages.get(&key).cloned().unwrap_or_default())
    }

    async fn fetch_detail(&self, item: &ItemRef) -> Result<EnrichedRow> {
        self.calls.lock().push(Call::Detail {
            login: item.login.clone(),
            at: self.elapsed(),
        });

        let delay = self
            .detail_delays
            .get(&item.login)
            .copied()
            .unwrap_or(DETAIL_DELAY_MS);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        if let Some(status) = self.failing_details.get(&item.login) {
            return Err(ApiError::with_status("detail failed", "Fake", *status).into());
        }
        Ok(row(&item.login))
    }
}

/// The row [`FakeBackend`] returns for `login`.
pub fn row(login: &str) -> EnrichedRow {
    EnrichedRow {
        login: login.to_string(),
        avatar_url: format!("https://avatars.example.com/{login}"),
        name: Some(login.to_uppercase()),
        followers: login.len() as u64,
        location: None,
        html_url: format!("https://github.com/{login}"),
    }
}

pub fn logins(rows: &[EnrichedRow]) -> Vec<&str> {
    rows.iter().map(|r| r.login.as_str()).collect()
}
