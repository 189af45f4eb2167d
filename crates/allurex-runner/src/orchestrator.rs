use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use allurex_aggregate::{aggregate, CycleInputs};
use allurex_core::source::{ENVIRONMENT_PATH, HISTORY_TREND_PATH, SUMMARY_PATH};
use allurex_core::{load, Artifact, ArtifactSource, Environment, HistoryTrend, LoadError};
use allurex_core::{Summary, TestCase};
use allurex_metrics::{CycleStats, MetricStore};
use tracing::{debug, error, info, warn};

/// Why a cycle produced nothing new.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("summary unavailable: {0}")]
    Summary(#[source] LoadError),

    #[error("cannot list test cases: {0}")]
    Enumeration(#[source] io::Error),

    #[error("cycle worker panicked: {0}")]
    Panicked(String),
}

/// What a successful cycle loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub environment: bool,
    pub history: bool,
    pub test_cases: usize,
    pub skipped_test_cases: usize,
    pub elapsed: Duration,
}

/// Runs one load → aggregate → publish pass over a report source.
pub struct Orchestrator {
    source: Arc<dyn ArtifactSource>,
    store: Arc<MetricStore>,
}

impl Orchestrator {
    pub fn new(source: Arc<dyn ArtifactSource>, store: Arc<MetricStore>) -> Self {
        Self { source, store }
    }

    pub fn store(&self) -> &Arc<MetricStore> {
        &self.store
    }

    /// Execute one full cycle. On error the published snapshot is untouched.
    pub fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let started = Instant::now();
        match self.collect() {
            Ok((inputs, mut report)) => {
                let snapshot = aggregate(&inputs);
                report.elapsed = started.elapsed();
                self.store.publish(
                    snapshot,
                    CycleStats {
                        finished: Instant::now(),
                        finished_at: SystemTime::now(),
                        elapsed: report.elapsed,
                        skipped_test_cases: report.skipped_test_cases as u64,
                    },
                );
                info!(
                    source = %self.source.describe(),
                    test_cases = report.test_cases,
                    skipped = report.skipped_test_cases,
                    environment = report.environment,
                    history = report.history,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "cycle published"
                );
                Ok(report)
            }
            Err(e) => {
                self.store.record_failure();
                error!(source = %self.source.describe(), error = %e, "cycle aborted; previous snapshot kept");
                Err(e)
            }
        }
    }

    fn collect(&self) -> Result<(CycleInputs, CycleReport), CycleError> {
        let environment = self.load_optional::<Environment>(ENVIRONMENT_PATH);

        let summary = load::<Summary>(self.source.as_ref(), Path::new(SUMMARY_PATH))
            .map_err(CycleError::Summary)?;

        let history = self.load_optional::<HistoryTrend>(HISTORY_TREND_PATH);

        let files = self
            .source
            .list_test_cases()
            .map_err(CycleError::Enumeration)?;

        let mut test_cases = Vec::with_capacity(files.len());
        let mut skipped = 0usize;
        for file in &files {
            match load::<TestCase>(self.source.as_ref(), file) {
                Ok(tc) => {
                    if tc.timing_inverted() {
                        warn!(
                            file = %file.display(),
                            start = tc.start_ms,
                            stop = tc.stop_ms,
                            "test case stops before it starts; duration clamped to 0"
                        );
                    }
                    test_cases.push(tc);
                }
                Err(e) => {
                    skipped += 1;
                    warn!(file = %file.display(), kind = e.kind().as_str(), error = %e, "test case skipped");
                }
            }
        }
        debug!(listed = files.len(), loaded = test_cases.len(), "test cases collected");

        let report = CycleReport {
            environment: environment.is_some(),
            history: history.is_some(),
            test_cases: test_cases.len(),
            skipped_test_cases: skipped,
            elapsed: Duration::ZERO,
        };
        let inputs = CycleInputs {
            summary,
            environment,
            history,
            test_cases,
        };
        Ok((inputs, report))
    }

    fn load_optional<A: Artifact>(&self, rel: &str) -> Option<A> {
        match load::<A>(self.source.as_ref(), Path::new(rel)) {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!(artifact = A::NAME, kind = e.kind().as_str(), error = %e, "optional artifact unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use allurex_core::MemorySource;

    const SUMMARY: &str =
        r#"{"statistic": {"passed": 2, "failed": 1, "broken": 0, "skipped": 0}, "time": {"duration": 3000}}"#;

    fn source_with_summary() -> Arc<MemorySource> {
        let source = Arc::new(MemorySource::new());
        source.insert(SUMMARY_PATH, SUMMARY);
        source
    }

    fn orchestrator(source: &Arc<MemorySource>) -> Orchestrator {
        Orchestrator::new(source.clone(), Arc::new(MetricStore::new()))
    }

    #[test]
    fn summary_only_is_a_successful_cycle() {
        let source = source_with_summary();
        let orch = orchestrator(&source);
        let report = orch.run_cycle().unwrap();
        assert!(!report.environment);
        assert!(!report.history);
        assert_eq!(report.test_cases, 0);

        let snap = orch.store().read();
        assert_eq!(snap.value("tests_total", &["passed"]), Some(2.0));
        assert_eq!(snap.value("suite_duration_seconds", &[]), Some(3.0));
        assert!(orch.store().status().last_success.is_some());
    }

    #[test]
    fn missing_summary_aborts_without_publishing() {
        let source = Arc::new(MemorySource::new());
        source.insert(ENVIRONMENT_PATH, r#"{"os": "linux"}"#);
        let orch = orchestrator(&source);

        let err = orch.run_cycle().unwrap_err();
        assert!(matches!(err, CycleError::Summary(ref e) if e.kind() == allurex_core::LoadErrorKind::Missing));
        assert_eq!(orch.store().read().series_count(), 0);
        let status = orch.store().status();
        assert_eq!(status.failures, 1);
        assert!(status.last_success.is_none());
    }

    #[test]
    fn malformed_optional_artifacts_degrade() {
        let source = source_with_summary();
        source.insert(ENVIRONMENT_PATH, "{oops");
        source.insert(HISTORY_TREND_PATH, r#"{"items": "nope"}"#);
        let orch = orchestrator(&source);

        let report = orch.run_cycle().unwrap();
        assert!(!report.environment);
        assert!(!report.history);
        let snap = orch.store().read();
        assert!(snap.family("environment_info").unwrap().is_empty());
        assert_eq!(snap.value("flaky_tests_ratio", &[]), None);
    }

    #[test]
    fn bad_test_case_is_skipped_others_kept() {
        let source = source_with_summary();
        source.insert(
            "data/test-cases/good.json",
            r#"{"uuid": "1", "name": "good", "status": "passed", "start": 0, "stop": 2000}"#,
        );
        source.insert("data/test-cases/bad.json", "not json at all");
        source.insert("data/test-cases/wrong.json", r#"{"labels": "x"}"#);
        let orch = orchestrator(&source);

        let report = orch.run_cycle().unwrap();
        assert_eq!(report.test_cases, 1);
        assert_eq!(report.skipped_test_cases, 2);
        let snap = orch.store().read();
        assert_eq!(
            snap.value("test_duration_seconds", &["good", "unknown"]),
            Some(2.0)
        );
        assert_eq!(
            orch.store().status().last_success.unwrap().skipped_test_cases,
            2
        );
    }

    #[test]
    fn null_optional_fields_do_not_skip_a_test_case() {
        let source = source_with_summary();
        source.insert(
            "data/test-cases/sparse.json",
            r#"{"name": "sparse", "status": "passed", "labels": null, "steps": null, "start": 0, "stop": 500}"#,
        );
        let orch = orchestrator(&source);

        let report = orch.run_cycle().unwrap();
        assert_eq!(report.test_cases, 1);
        assert_eq!(report.skipped_test_cases, 0);
        let snap = orch.store().read();
        assert_eq!(
            snap.value("test_status", &["sparse", "passed", "unknown"]),
            Some(1.0)
        );
    }

    #[test]
    fn enumeration_failure_aborts() {
        let source = source_with_summary();
        source.fail_listing(Some(io::ErrorKind::PermissionDenied));
        let orch = orchestrator(&source);
        assert!(matches!(
            orch.run_cycle().unwrap_err(),
            CycleError::Enumeration(_)
        ));
        assert_eq!(orch.store().read().series_count(), 0);
    }
}
