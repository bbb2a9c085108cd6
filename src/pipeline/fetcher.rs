//! Two-stage fetch cycles with switch-to-latest cancellation.
//!
//! Each call to [`CancellableFetcher::start`] opens a new cycle under a fresh
//! generation from the [`StateStore`] and cancels the previous one. Cancellation drops the old
//! cycle's outstanding requests; the generation check in [`StateStore`]
//! keeps a cycle that races past its cancellation from publishing anything.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::SearchError;
use crate::query::QuerySpec;
use crate::remote::SearchBackend;
use crate::state::StateStore;

use super::classify::{FailureClassifier, FailureKind, FetchStage};
use super::enricher::ResultEnricher;

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Settled { rows: usize, total_count: u64 },
    Failed(FailureKind),
    /// A newer cycle started (or the pipeline shut down) before this one finished
    Superseded,
}

struct LiveCycle {
    generation: u64,
    cancel: CancellationToken,
    task: JoinHandle<CycleOutcome>,
}

/// Everything a spawned cycle needs, shared across cycles.
struct CycleContext<B> {
    backend: Arc<B>,
    enricher: Arc<ResultEnricher<B>>,
    classifier: FailureClassifier,
    state: Arc<StateStore>,
}

impl<B> Clone for CycleContext<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            enricher: Arc::clone(&self.enricher),
            classifier: self.classifier,
            state: Arc::clone(&self.state),
        }
    }
}

pub struct CancellableFetcher<B> {
    ctx: CycleContext<B>,
    parent: CancellationToken,
    current: Option<LiveCycle>,
}

impl<B: SearchBackend + 'static> CancellableFetcher<B> {
    /// `parent` cancels every cycle, present and future, when triggered.
    pub fn new(
        backend: Arc<B>,
        detail_concurrency: Option<usize>,
        classifier: FailureClassifier,
        state: Arc<StateStore>,
        parent: CancellationToken,
    ) -> Self {
        let enricher = Arc::new(ResultEnricher::new(Arc::clone(&backend), detail_concurrency));
        Self {
            ctx: CycleContext {
                backend,
                enricher,
                classifier,
                state,
            },
            parent,
            current: None,
        }
    }

    /// Supersede any running cycle and start fetching `spec`.
    ///
    /// Returns the generation of the new cycle.
    pub fn start(&mut self, spec: QuerySpec) -> u64 {
        self.cancel_current();

        let generation = self.ctx.state.begin_cycle();

        let cancel = self.parent.child_token();
        let ctx = self.ctx.clone();
        let task_cancel = cancel.clone();
        tracing::debug!(generation, %spec, "starting fetch cycle");
        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = task_cancel.cancelled() => CycleOutcome::Superseded,
                outcome = run_cycle(ctx, spec, generation) => outcome,
            }
        });

        self.current = Some(LiveCycle {
            generation,
            cancel,
            task,
        });
        generation
    }

    /// Cancel the running cycle, if any, without waiting for it.
    pub fn cancel_current(&mut self) {
        if let Some(cycle) = self.current.take() {
            if !cycle.task.is_finished() {
                tracing::debug!(generation = cycle.generation, "superseding fetch cycle");
            }
            cycle.cancel.cancel();
        }
    }

    pub fn current_generation(&self) -> Option<u64> {
        self.current.as_ref().map(|c| c.generation)
    }

    /// Wait for the most recently started cycle to finish.
    pub async fn join_current(&mut self) -> Option<CycleOutcome> {
        let cycle = self.current.take()?;
        match cycle.task.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(generation = cycle.generation, "fetch cycle task failed: {e}");
                None
            }
        }
    }
}

async fn run_cycle<B: SearchBackend>(
    ctx: CycleContext<B>,
    spec: QuerySpec,
    generation: u64,
) -> CycleOutcome {
    let mut page = match ctx.backend.search(&spec).await {
        Ok(page) => page,
        Err(e) => return fail(&ctx, generation, FetchStage::Search, &e),
    };

    if !ctx.state.is_live(generation) {
        return CycleOutcome::Superseded;
    }

    page.items.truncate(spec.page_size() as usize);
    tracing::debug!(
        generation,
        total_count = page.total_count,
        items = page.items.len(),
        "search page received"
    );

    let rows = match ctx.enricher.enrich(&page.items).await {
        Ok(rows) => rows,
        Err(e) => return fail(&ctx, generation, FetchStage::Enrichment, &e),
    };

    let row_count = rows.len();
    if ctx.state.settle(generation, page.total_count, rows) {
        tracing::debug!(generation, rows = row_count, "fetch cycle settled");
        CycleOutcome::Settled {
            rows: row_count,
            total_count: page.total_count,
        }
    } else {
        CycleOutcome::Superseded
    }
}

fn fail<B>(
    ctx: &CycleContext<B>,
    generation: u64,
    stage: FetchStage,
    error: &SearchError,
) -> CycleOutcome {
    let kind = ctx.classifier.classify(stage, error);
    if !ctx.state.fail(generation, kind) {
        return CycleOutcome::Superseded;
    }
    tracing::warn!(generation, %stage, ?kind, "fetch cycle failed: {error}");
    CycleOutcome::Failed(kind)
}
