//! HTTP error handling for remote backends.
//!
//! Converts non-success responses into `SearchError`, preserving the status
//! information the failure classifier relies on.

use std::fmt;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;

use crate::error::SearchError;

/// Retry hint used when a throttled response carries no Retry-After header.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// API error that preserves HTTP status information.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code, if available
    pub status: Option<StatusCode>,
    /// Retry-After header value in seconds, if available
    pub retry_after: Option<u64>,
    /// Human-readable error message
    pub message: String,
    /// Provider name for context (e.g., "GitHub")
    pub provider: &'static str,
}

impl ApiError {
    pub fn new(message: impl Into<String>, provider: &'static str) -> Self {
        Self {
            status: None,
            retry_after: None,
            message: message.into(),
            provider,
        }
    }

    pub fn with_status(
        message: impl Into<String>,
        provider: &'static str,
        status: StatusCode,
    ) -> Self {
        Self {
            status: Some(status),
            retry_after: None,
            message: message.into(),
            provider,
        }
    }

    pub fn with_retry_after(mut self, seconds: Option<u64>) -> Self {
        self.retry_after = seconds;
        self
    }

    /// 403 and 429 both signal an exhausted quota on the GitHub API.
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self.status,
            Some(StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS)
        )
    }

    pub fn to_search_error(&self) -> SearchError {
        if self.is_rate_limited() {
            return SearchError::RateLimited(self.retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS));
        }

        match self.status {
            Some(StatusCode::NOT_FOUND) => SearchError::NotFound(self.message.clone()),
            Some(status) => SearchError::Api(format!(
                "{} API error ({} {}): {}",
                self.provider,
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
                self.message
            )),
            None => SearchError::Api(format!("{} API error: {}", self.provider, self.message)),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ApiError> for SearchError {
    fn from(error: ApiError) -> Self {
        error.to_search_error()
    }
}

/// Read the Retry-After header as whole seconds.
pub fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

/// Extract the `message` field GitHub puts in error bodies, falling back to
/// the raw body text.
pub fn error_body_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
