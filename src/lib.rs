pub mod config;
pub mod error;
pub mod pipeline;
pub mod query;
pub mod remote;
pub mod state;
pub mod trigger;

pub use config::Config;
pub use error::{Result, SearchError};
pub use pipeline::{
    CancellableFetcher, CycleOutcome, FailureClassifier, FailureKind, FailurePolicy, FetchStage,
    PipelineHandle, ResultEnricher, SearchPipeline,
};
pub use query::{PageRequest, QuerySpec, SortDirection, SortSpec};
pub use remote::{EnrichedRow, GitHubBackend, ItemRef, SearchBackend, SearchPage};
pub use state::{QueryPhase, QueryState, StateEvent, StateStore};
pub use trigger::{
    SearchTriggerFilter, TriggerAggregator, TriggerEvent, TriggerSender, TriggerSource,
};
