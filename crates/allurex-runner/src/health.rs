use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use allurex_metrics::MetricStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    Ok,
    Unhealthy(String),
}

impl Health {
    pub fn is_ok(&self) -> bool {
        matches!(self, Health::Ok)
    }
}

/// Freshness check against the time of the last successful publish.
///
/// Timestamps inside the report artifacts are deliberately ignored: a
/// re-copied old report is still fresh data as far as the exporter goes.
#[derive(Clone)]
pub struct HealthReporter {
    store: Arc<MetricStore>,
    stale_after: Duration,
}

impl HealthReporter {
    pub fn new(store: Arc<MetricStore>, stale_after: Duration) -> Self {
        Self { store, stale_after }
    }

    pub fn check(&self) -> Health {
        self.check_at(Instant::now())
    }

    pub fn check_at(&self, now: Instant) -> Health {
        let Some(last) = self.store.status().last_success else {
            return Health::Unhealthy("no successful update yet".to_string());
        };
        let age = now.saturating_duration_since(last.finished);
        if age > self.stale_after {
            Health::Unhealthy(format!(
                "data is stale: last successful update at {} ({}s ago, limit {}s)",
                rfc3339(last.finished_at),
                age.as_secs(),
                self.stale_after.as_secs()
            ))
        } else {
            Health::Ok
        }
    }
}

fn rfc3339(at: SystemTime) -> String {
    time::OffsetDateTime::from(at)
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}
