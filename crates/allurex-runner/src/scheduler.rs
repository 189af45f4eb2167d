use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::orchestrator::{CycleError, CycleReport, Orchestrator};

/// Result of asking the scheduler for one cycle.
#[derive(Debug)]
pub enum CycleRun {
    Published(CycleReport),
    Aborted(CycleError),
    /// Another cycle was still in flight; nothing was started.
    Skipped,
}

/// Drives the orchestrator: once at start, then every `interval`, never
/// two cycles at the same time.
pub struct Scheduler {
    orchestrator: Arc<Orchestrator>,
    in_flight: Mutex<()>,
}

impl Scheduler {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            in_flight: Mutex::new(()),
        }
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    /// Run one cycle on the blocking pool unless one is already running.
    pub async fn run_once(&self) -> CycleRun {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!("previous cycle still running; tick skipped");
            return CycleRun::Skipped;
        };

        let orchestrator = Arc::clone(&self.orchestrator);
        match tokio::task::spawn_blocking(move || orchestrator.run_cycle()).await {
            Ok(Ok(report)) => CycleRun::Published(report),
            Ok(Err(e)) => CycleRun::Aborted(e),
            Err(join_err) => {
                self.orchestrator.store().record_failure();
                warn!(error = %join_err, "cycle worker did not complete");
                CycleRun::Aborted(CycleError::Panicked(join_err.to_string()))
            }
        }
    }

    /// Spawn the periodic loop. The first cycle runs immediately.
    pub fn start(self: Arc<Self>, interval: Duration) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            info!(interval_secs = interval.as_secs_f64(), "scheduler started");
            self.run_once().await;

            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        // Not raced against cancellation: an in-flight cycle finishes.
                        self.run_once().await;
                    }
                }
            }
            info!("scheduler stopped");
        });

        SchedulerHandle { cancel, task }
    }
}

/// Owner of a running scheduler loop.
pub struct SchedulerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop ticking and wait for any in-flight cycle to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "scheduler task ended abnormally");
        }
    }
}
