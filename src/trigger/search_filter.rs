//! Shaping of the raw search-text trigger.
//!
//! Keystrokes pass three gates before they reach the aggregator:
//! - values of `min_len` characters or fewer are dropped outright
//! - an accepted value waits for a quiet period; a newer accepted value
//!   restarts the wait and replaces it
//! - a value equal to the last forwarded one is suppressed

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::SearchConfig;

use super::TriggerSender;

pub struct SearchTriggerFilter {
    min_len: usize,
    debounce: Duration,
    last_forwarded: Option<String>,
}

enum Wake {
    Input(Option<String>),
    Quiet,
    Shutdown,
}

impl SearchTriggerFilter {
    pub fn new(min_len: usize, debounce: Duration) -> Self {
        Self {
            min_len,
            debounce,
            last_forwarded: None,
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.min_query_len, config.debounce())
    }

    /// Whether a value is long enough to be searched for.
    pub fn accepts(&self, value: &str) -> bool {
        value.chars().count() > self.min_len
    }

    /// Record `value` as forwarded unless it repeats the previous one.
    fn take_distinct(&mut self, value: String) -> Option<String> {
        if self.last_forwarded.as_deref() == Some(value.as_str()) {
            return None;
        }
        self.last_forwarded = Some(value.clone());
        Some(value)
    }

    /// Read raw values until `raw` closes or `shutdown` fires, forwarding
    /// the shaped ones to `out`. A value still waiting when `raw` closes is
    /// flushed.
    pub async fn run(
        mut self,
        mut raw: mpsc::UnboundedReceiver<String>,
        out: TriggerSender,
        shutdown: CancellationToken,
    ) {
        let mut pending: Option<(String, Instant)> = None;

        loop {
            let deadline = pending.as_ref().map(|(_, deadline)| *deadline);
            let wake = tokio::select! {
                biased;
                _ = shutdown.cancelled() => Wake::Shutdown,
                _ = sleep_until(deadline) => Wake::Quiet,
                value = raw.recv() => Wake::Input(value),
            };

            match wake {
                Wake::Shutdown => return,
                Wake::Input(Some(value)) => {
                    if self.accepts(&value) {
                        pending = Some((value, Instant::now() + self.debounce));
                    } else {
                        tracing::trace!(len = value.chars().count(), "search text too short");
                    }
                }
                Wake::Input(None) => {
                    if let Some((value, _)) = pending.take() {
                        self.forward(value, &out);
                    }
                    return;
                }
                Wake::Quiet => {
                    if let Some((value, _)) = pending.take()
                        && !self.forward(value, &out)
                    {
                        return;
                    }
                }
            }
        }
    }

    /// Returns false once the aggregator has gone away.
    fn forward(&mut self, value: String, out: &TriggerSender) -> bool {
        match self.take_distinct(value) {
            Some(value) => {
                tracing::debug!(text = %value, "forwarding search text");
                out.search(value).is_ok()
            }
            None => true,
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
