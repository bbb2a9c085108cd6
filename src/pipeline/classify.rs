//! Failure classification for fetch cycles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Stage of a fetch cycle in which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    /// Stage 1: the paged search request
    Search,
    /// Stage 2: the per-item detail fan-out
    Enrichment,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStage::Search => write!(f, "search"),
            FetchStage::Enrichment => write!(f, "enrichment"),
        }
    }
}

/// Outcome of classifying a failed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Generic,
    RateLimited,
}

/// How failures are mapped to a [`FailureKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Every enrichment failure counts as rate limiting, every search
    /// failure as generic.
    #[default]
    Conservative,
    /// Rate limiting is reported only for throttling responses (403/429),
    /// whichever stage they come from.
    StatusAware,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FailureClassifier {
    policy: FailurePolicy,
}

impl FailureClassifier {
    pub fn new(policy: FailurePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn classify(&self, stage: FetchStage, error: &SearchError) -> FailureKind {
        match self.policy {
            FailurePolicy::Conservative => match stage {
                FetchStage::Search => FailureKind::Generic,
                FetchStage::Enrichment => FailureKind::RateLimited,
            },
            FailurePolicy::StatusAware => {
                if error.is_rate_limited() {
                    FailureKind::RateLimited
                } else {
                    FailureKind::Generic
                }
            }
        }
    }
}
