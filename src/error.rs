use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("rate limited, retry after {0}s")]
    RateLimited(u64),

    #[error("search pipeline has shut down")]
    PipelineClosed,

    #[error("remote item not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SearchError {
    /// Whether this error reports that the remote API throttled the request.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SearchError::RateLimited(_))
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
