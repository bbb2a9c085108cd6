//! Query orchestration.
//!
//! `SearchPipeline::spawn` wires the trigger producers, the search-text
//! filter, the aggregator and the fetcher together:
//!
//! ```text
//! text_changed ─► SearchTriggerFilter ─┐
//! sort_changed ────────────────────────┼─► TriggerAggregator ─► CancellableFetcher ─► StateStore
//! page_changed ────────────────────────┘
//! ```
//!
//! One event loop task owns the aggregator and fetcher, so triggers are
//! handled one at a time in arrival order; only network calls run
//! concurrently.

pub mod classify;
pub mod enricher;
pub mod fetcher;

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Result, SearchError};
use crate::query::{PageRequest, SortDirection, SortSpec};
use crate::remote::SearchBackend;
use crate::state::{QueryState, StateEvent, StateStore};
use crate::trigger::{SearchTriggerFilter, TriggerAggregator, TriggerSender};

pub use classify::{FailureClassifier, FailureKind, FailurePolicy, FetchStage};
pub use enricher::ResultEnricher;
pub use fetcher::{CancellableFetcher, CycleOutcome};

pub struct SearchPipeline;

impl SearchPipeline {
    /// Start the pipeline on the current tokio runtime.
    pub fn spawn<B: SearchBackend + 'static>(
        backend: Arc<B>,
        config: &Config,
    ) -> Result<PipelineHandle> {
        config.validate()?;

        let state = Arc::new(StateStore::new());
        let shutdown = CancellationToken::new();

        let (aggregator, triggers) =
            TriggerAggregator::channel(config.search.sort.clone(), config.search.initial_page()?);

        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let filter = SearchTriggerFilter::from_config(&config.search);
        let filter_task = tokio::spawn(filter.run(raw_rx, triggers.clone(), shutdown.clone()));

        let fetcher = CancellableFetcher::new(
            backend,
            config.search.detail_concurrency,
            FailureClassifier::new(config.failure_policy),
            Arc::clone(&state),
            shutdown.child_token(),
        );
        let loop_task = tokio::spawn(run_event_loop(aggregator, fetcher, shutdown.clone()));

        Ok(PipelineHandle {
            raw_text: raw_tx,
            triggers,
            page_size: config.search.page_size,
            state,
            shutdown,
            tasks: vec![filter_task, loop_task],
        })
    }
}

async fn run_event_loop<B: SearchBackend + 'static>(
    mut aggregator: TriggerAggregator,
    mut fetcher: CancellableFetcher<B>,
    shutdown: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            next = aggregator.next() => next,
        };

        let Some((source, spec)) = next else {
            break;
        };
        let generation = fetcher.start(spec);
        tracing::debug!(%source, generation, "trigger accepted");
    }

    fetcher.cancel_current();
    tracing::debug!("search pipeline stopped");
}

/// Presentation-facing handle: forwards user events in, exposes state out.
pub struct PipelineHandle {
    raw_text: mpsc::UnboundedSender<String>,
    triggers: TriggerSender,
    page_size: u32,
    state: Arc<StateStore>,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl PipelineHandle {
    /// Raw search input; shaped by the search-text filter before it counts.
    pub fn text_changed(&self, value: impl Into<String>) -> Result<()> {
        self.raw_text
            .send(value.into())
            .map_err(|_| SearchError::PipelineClosed)
    }

    pub fn sort_changed(&self, key: impl Into<String>, direction: SortDirection) -> Result<()> {
        self.triggers.sort(SortSpec::new(key, direction))
    }

    pub fn page_changed(&self, index: u32, size: u32) -> Result<()> {
        self.triggers.page(PageRequest::new(index, size)?)
    }

    /// Page change that keeps the configured page size.
    pub fn go_to_page(&self, index: u32) -> Result<()> {
        self.page_changed(index, self.page_size)
    }

    pub fn state(&self) -> QueryState {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.state.subscribe()
    }

    pub fn store(&self) -> Arc<StateStore> {
        Arc::clone(&self.state)
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    /// Stop accepting triggers, cancel the live cycle and wait for the
    /// pipeline tasks to exit.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!("search pipeline task failed: {e}");
            }
        }
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
