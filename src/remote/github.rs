//! GitHub REST search backend.
//!
//! Stage 1 calls `GET /search/{resource}` and stage 2 calls
//! `GET /{resource}/{login}` for each hit. Credentials are left to the
//! transport: callers that need them pass a `reqwest::Client` carrying
//! default headers to [`GitHubBackend::with_client`].

use std::time::Duration;

use reqwest::Client;
use reqwest::header;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Config;
use crate::error::{Result, SearchError};
use crate::query::QuerySpec;

use super::error::{ApiError, error_body_message, retry_after_secs};
use super::{EnrichedRow, ItemRef, SearchBackend, SearchPage};

const PROVIDER: &str = "GitHub";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// GitHub search backend
pub struct GitHubBackend {
    client: Client,
    base_url: Url,
    resource: String,
}

impl GitHubBackend {
    /// Create a backend from configuration
    ///
    /// Builds a client with the configured user agent and request and
    /// connect timeouts.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.api.user_agent.clone())
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .connect_timeout(Duration::from_secs(config.api.connect_timeout_secs))
            .build()?;
        Self::with_client(client, config)
    }

    /// Use a caller-built client, e.g. one with an `Authorization` default
    /// header. Only the API location is taken from `config`.
    pub fn with_client(client: Client, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client,
            base_url: config.api_base_url()?,
            resource: config.api.resource.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SearchError::Config(format!("base URL '{}' cannot have a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET /search/{resource}?q=..&sort=..&order=..&page=..&per_page=..`
    pub fn search_url(&self, spec: &QuerySpec) -> Result<Url> {
        let mut url = self.endpoint(&["search", self.resource.as_str()])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("q", spec.text());
            if !spec.sort().is_relevance() {
                query.append_pair("sort", spec.sort_key());
                query.append_pair("order", spec.sort_direction().as_str());
            }
            query.append_pair("page", &spec.search_page_number().to_string());
            query.append_pair("per_page", &spec.page_size().to_string());
        }
        Ok(url)
    }

    /// `GET /{resource}/{login}`
    pub fn detail_url(&self, item: &ItemRef) -> Result<Url> {
        if item.login.is_empty() {
            return Err(SearchError::InvalidQuery(
                "item reference has an empty login".to_string(),
            ));
        }
        self.endpoint(&[self.resource.as_str(), item.login.as_str()])
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, GITHUB_ACCEPT)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let retry_after = retry_after_secs(response.headers());
            let body = response.text().await.unwrap_or_default();
            let message = if status == reqwest::StatusCode::NOT_FOUND {
                url.to_string()
            } else {
                error_body_message(&body)
            };
            tracing::debug!(%status, %url, "{PROVIDER} request failed: {message}");
            return Err(ApiError::with_status(message, PROVIDER, status)
                .with_retry_after(retry_after)
                .into());
        }

        Ok(response.json::<T>().await?)
    }
}

impl SearchBackend for GitHubBackend {
    async fn search(&self, spec: &QuerySpec) -> Result<SearchPage> {
        let url = self.search_url(spec)?;
        self.get_json(url).await
    }

    async fn fetch_detail(&self, item: &ItemRef) -> Result<EnrichedRow> {
        let url = self.detail_url(item)?;
        self.get_json(url).await
    }
}
