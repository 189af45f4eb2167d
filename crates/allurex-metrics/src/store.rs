use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant, SystemTime};

use crate::encode::{encode_text, Namespace};
use crate::snapshot::MetricSnapshot;

/// What the worker reports alongside a freshly built snapshot.
#[derive(Debug, Clone, Copy)]
pub struct CycleStats {
    /// Monotonic completion time, used for staleness.
    pub finished: Instant,
    /// Wall-clock completion time, exported as a timestamp.
    pub finished_at: SystemTime,
    pub elapsed: Duration,
    pub skipped_test_cases: u64,
}

/// Publication bookkeeping, read together with the snapshot.
#[derive(Debug, Clone, Default)]
pub struct PublishStatus {
    pub last_success: Option<CycleStats>,
    pub successes: u64,
    pub failures: u64,
}

#[derive(Debug, Default)]
struct StoreState {
    snapshot: Arc<MetricSnapshot>,
    status: PublishStatus,
}

/// The live metrics sink: one writer (the cycle worker), many readers.
///
/// Readers get an `Arc` of a complete snapshot. `publish` moves the new
/// cycle into a freshly registered snapshot and swaps the `Arc` under the
/// write lock, so nobody ever sees a half-applied cycle and families the
/// new cycle left empty are empty in the published view.
#[derive(Debug, Default)]
pub struct MetricStore {
    state: RwLock<StoreState>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the published families with `snapshot` and record success.
    pub fn publish(&self, snapshot: MetricSnapshot, stats: CycleStats) {
        let mut next = MetricSnapshot::new();
        next.absorb(snapshot);
        let next = Arc::new(next);

        let mut state = self.write_state();
        state.snapshot = next;
        state.status.last_success = Some(stats);
        state.status.successes += 1;
        tracing::debug!(series = state.snapshot.series_count(), "snapshot published");
    }

    /// Record an aborted cycle. The published snapshot is left untouched.
    pub fn record_failure(&self) {
        self.write_state().status.failures += 1;
    }

    pub fn read(&self) -> Arc<MetricSnapshot> {
        Arc::clone(&self.read_state().snapshot)
    }

    pub fn status(&self) -> PublishStatus {
        self.read_state().status.clone()
    }

    /// Snapshot and status taken under one lock.
    pub fn view(&self) -> (Arc<MetricSnapshot>, PublishStatus) {
        let state = self.read_state();
        (Arc::clone(&state.snapshot), state.status.clone())
    }

    /// Text exposition of everything currently published.
    pub fn render(&self, namespace: &Namespace) -> String {
        let (snapshot, status) = self.view();
        encode_text(namespace, &snapshot, &status)
    }
}
