//! Shared query state read by the presentation layer.
//!
//! `StateStore` is the single owner of [`QueryState`]. It hands out cycle
//! generations itself, and every later mutation carries the generation of the
//! cycle that produced it and is applied only while that generation is still
//! the live one, so a superseded cycle can never overwrite the state of its
//! successor.

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::pipeline::classify::FailureKind;
use crate::remote::EnrichedRow;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Lifecycle position of the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryPhase {
    #[default]
    Idle,
    Loading,
    Settled,
    Failed(FailureKind),
}

/// Latest results plus the flags the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryState {
    pub rows: Vec<EnrichedRow>,
    pub total_count: u64,
    pub loading: bool,
    pub rate_limited: bool,
    pub phase: QueryPhase,
    /// Generation of the cycle allowed to mutate this state; 0 before the first cycle
    pub cycle: u64,
}

/// Notification sent whenever the state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    CycleStarted { cycle: u64 },
    Settled { cycle: u64, rows: usize, total_count: u64 },
    Failed { cycle: u64, kind: FailureKind },
}

pub struct StateStore {
    state: RwLock<QueryState>,
    events: broadcast::Sender<StateEvent>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(QueryState::default()),
            events,
        }
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> QueryState {
        self.state.read().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.events.subscribe()
    }

    pub fn is_live(&self, cycle: u64) -> bool {
        self.state.read().cycle == cycle
    }

    /// Open a new cycle, superseding the live one, and enter `Loading`.
    ///
    /// Returns the new cycle's generation. Rows and total count are left in
    /// place until the cycle settles.
    pub fn begin_cycle(&self) -> u64 {
        let cycle = {
            let mut state = self.state.write();
            state.cycle += 1;
            state.loading = true;
            state.rate_limited = false;
            state.phase = QueryPhase::Loading;
            state.cycle
        };
        let _ = self.events.send(StateEvent::CycleStarted { cycle });
        cycle
    }

    /// Publish a successful cycle. Returns false if `cycle` was superseded.
    pub fn settle(&self, cycle: u64, total_count: u64, rows: Vec<EnrichedRow>) -> bool {
        let row_count = rows.len();
        {
            let mut state = self.state.write();
            if state.cycle != cycle {
                return false;
            }
            state.rows = rows;
            state.total_count = total_count;
            state.loading = false;
            state.rate_limited = false;
            state.phase = QueryPhase::Settled;
        }
        let _ = self.events.send(StateEvent::Settled {
            cycle,
            rows: row_count,
            total_count,
        });
        true
    }

    /// Record a failed cycle, leaving rows and total count untouched.
    /// Returns false if `cycle` was superseded.
    pub fn fail(&self, cycle: u64, kind: FailureKind) -> bool {
        {
            let mut state = self.state.write();
            if state.cycle != cycle {
                return false;
            }
            state.loading = false;
            state.rate_limited = kind == FailureKind::RateLimited;
            state.phase = QueryPhase::Failed(kind);
        }
        let _ = self.events.send(StateEvent::Failed { cycle, kind });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(login: &str) -> EnrichedRow {
        EnrichedRow {
            login: login.to_string(),
            avatar_url: String::new(),
            name: None,
            followers: 0,
            location: None,
            html_url: String::new(),
        }
    }

    #[test]
    fn test_initial_state_is_idle() {
        let store = StateStore::new();
        let state = store.snapshot();
        assert_eq!(state.phase, QueryPhase::Idle);
        assert!(state.rows.is_empty());
        assert_eq!(state.total_count, 0);
        assert!(!state.loading);
        assert!(!state.rate_limited);
    }

    #[test]
    fn test_begin_cycle_resets_flags_but_keeps_rows() {
        let store = StateStore::new();
        let first = store.begin_cycle();
        assert!(store.settle(first, 5, vec![row("a")]));
        let second = store.begin_cycle();
        assert!(store.fail(second, FailureKind::RateLimited));

        let third = store.begin_cycle();
        assert_eq!(third, 3);
        let state = store.snapshot();
        assert!(state.loading);
        assert!(!state.rate_limited);
        assert_eq!(state.phase, QueryPhase::Loading);
        assert_eq!(state.rows, vec![row("a")]);
        assert_eq!(state.total_count, 5);
    }

    #[test]
    fn test_settle_updates_rows() {
        let store = StateStore::new();
        let cycle = store.begin_cycle();
        assert_eq!(cycle, 1);
        assert!(store.settle(cycle, 2, vec![row("a"), row("b")]));

        let state = store.snapshot();
        assert_eq!(state.phase, QueryPhase::Settled);
        assert_eq!(state.total_count, 2);
        assert_eq!(state.rows.len(), 2);
        assert!(!state.loading);
    }

    #[test]
    fn test_failure_leaves_rows_in_place() {
        let store = StateStore::new();
        let first = store.begin_cycle();
        store.settle(first, 1, vec![row("a")]);

        let second = store.begin_cycle();
        assert!(store.fail(second, FailureKind::Generic));
        let state = store.snapshot();
        assert_eq!(state.phase, QueryPhase::Failed(FailureKind::Generic));
        assert_eq!(state.rows, vec![row("a")]);
        assert!(!state.loading);
        assert!(!state.rate_limited);

        let third = store.begin_cycle();
        assert!(store.fail(third, FailureKind::RateLimited));
        assert!(store.snapshot().rate_limited);
    }

    #[test]
    fn test_superseded_cycle_cannot_mutate() {
        let store = StateStore::new();
        let old = store.begin_cycle();
        let new = store.begin_cycle();

        assert!(!store.settle(old, 9, vec![row("stale")]));
        assert!(!store.fail(old, FailureKind::RateLimited));

        let state = store.snapshot();
        assert!(state.loading);
        assert!(state.rows.is_empty());
        assert!(store.is_live(new));
        assert!(!store.is_live(old));
    }

    #[test]
    fn test_generations_are_unique_across_callers() {
        let store = std::sync::Arc::new(StateStore::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || (0..25).map(|_| store.begin_cycle()).collect::<Vec<_>>())
            })
            .collect();

        let mut cycles: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        cycles.sort_unstable();
        cycles.dedup();
        assert_eq!(cycles.len(), 100);
        assert_eq!(store.snapshot().cycle, 100);
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let store = StateStore::new();
        let mut rx = store.subscribe();

        let first = store.begin_cycle();
        store.settle(first, 3, vec![row("a")]);
        let second = store.begin_cycle();
        store.fail(second, FailureKind::Generic);
        // Superseded updates emit nothing
        store.fail(first, FailureKind::Generic);

        assert_eq!(rx.recv().await.unwrap(), StateEvent::CycleStarted { cycle: 1 });
        assert_eq!(
            rx.recv().await.unwrap(),
            StateEvent::Settled {
                cycle: 1,
                rows: 1,
                total_count: 3
            }
        );
        assert_eq!(rx.recv().await.unwrap(), StateEvent::CycleStarted { cycle: 2 });
        assert_eq!(
            rx.recv().await.unwrap(),
            StateEvent::Failed {
                cycle: 2,
                kind: FailureKind::Generic
            }
        );
        assert!(rx.try_recv().is_err());
    }
}
