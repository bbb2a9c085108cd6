//! Trigger aggregation.
//!
//! The three user triggers (search text, sort order, page position) are
//! written by independent producers into one channel, so events are handled
//! strictly in arrival order. The aggregator folds each event into the
//! current query position and yields the resulting [`QuerySpec`].

pub mod search_filter;

use std::fmt;

use tokio::sync::mpsc;

use crate::error::{Result, SearchError};
use crate::query::{PageRequest, QuerySpec, SortSpec};

pub use search_filter::SearchTriggerFilter;

/// Which control produced a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Search,
    Sort,
    Page,
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerSource::Search => write!(f, "search"),
            TriggerSource::Sort => write!(f, "sort"),
            TriggerSource::Page => write!(f, "page"),
        }
    }
}

/// One trigger with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Debounced search text
    Search(String),
    Sort(SortSpec),
    Page(PageRequest),
}

impl TriggerEvent {
    pub fn source(&self) -> TriggerSource {
        match self {
            TriggerEvent::Search(_) => TriggerSource::Search,
            TriggerEvent::Sort(_) => TriggerSource::Sort,
            TriggerEvent::Page(_) => TriggerSource::Page,
        }
    }
}

/// Producer side of the trigger channel. Cheap to clone, one per source.
#[derive(Debug, Clone)]
pub struct TriggerSender {
    tx: mpsc::UnboundedSender<TriggerEvent>,
}

impl TriggerSender {
    pub fn send(&self, event: TriggerEvent) -> Result<()> {
        self.tx.send(event).map_err(|_| SearchError::PipelineClosed)
    }

    pub fn search(&self, text: impl Into<String>) -> Result<()> {
        self.send(TriggerEvent::Search(text.into()))
    }

    pub fn sort(&self, sort: SortSpec) -> Result<()> {
        self.send(TriggerEvent::Sort(sort))
    }

    pub fn page(&self, page: PageRequest) -> Result<()> {
        self.send(TriggerEvent::Page(page))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Merges trigger events and tracks the query position they describe.
pub struct TriggerAggregator {
    rx: mpsc::UnboundedReceiver<TriggerEvent>,
    text: String,
    sort: SortSpec,
    page: PageRequest,
}

impl TriggerAggregator {
    /// Create the aggregator and the sender its producers write to.
    pub fn channel(sort: SortSpec, page: PageRequest) -> (Self, TriggerSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        let aggregator = Self {
            rx,
            text: String::new(),
            sort,
            page,
        };
        (aggregator, TriggerSender { tx })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn page(&self) -> PageRequest {
        self.page
    }

    /// Fold one event into the current position.
    ///
    /// A sort change moves back to the first page. Returns `None` while no
    /// search text has been entered yet, since there is nothing to query.
    pub fn apply(&mut self, event: TriggerEvent) -> Option<QuerySpec> {
        match event {
            TriggerEvent::Search(text) => self.text = text,
            TriggerEvent::Sort(sort) => {
                self.sort = sort;
                self.page = self.page.rewind();
            }
            TriggerEvent::Page(page) => self.page = page,
        }

        if self.text.is_empty() {
            return None;
        }

        Some(QuerySpec::new(self.text.clone(), self.sort.clone(), self.page))
    }

    /// Receive the next raw event, in arrival order.
    pub async fn recv(&mut self) -> Option<TriggerEvent> {
        self.rx.recv().await
    }

    /// Wait for the next event that yields a query.
    ///
    /// Returns `None` once every producer has been dropped.
    pub async fn next(&mut self) -> Option<(TriggerSource, QuerySpec)> {
        loop {
            let event = self.rx.recv().await?;
            let source = event.source();
            match self.apply(event) {
                Some(spec) => return Some((source, spec)),
                None => tracing::debug!(%source, "trigger before any search text, not fetching"),
            }
        }
    }
}
