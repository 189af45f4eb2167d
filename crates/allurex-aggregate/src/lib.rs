//! Pure metric derivation: the loaded artifacts of one cycle in, a complete
//! [`MetricSnapshot`] out. Nothing here touches the filesystem or the store.

use std::collections::BTreeMap;

use allurex_core::model::{label, TestCase, TestStatus};
use allurex_core::{Environment, HistoryTrend, Summary};
use allurex_metrics::family::{
    ENVIRONMENT_INFO, FLAKY_RATIO, HISTORY_FAILED, SUITE_DURATION, TESTS_BY_LABEL, TESTS_TOTAL,
    TEST_DURATION, TEST_DURATION_HISTOGRAM, TEST_STATUS, TEST_STEPS,
};
use allurex_metrics::MetricSnapshot;

/// Everything one cycle managed to load. `summary` is the only required part.
#[derive(Debug, Clone)]
pub struct CycleInputs {
    pub summary: Summary,
    pub environment: Option<Environment>,
    pub history: Option<HistoryTrend>,
    pub test_cases: Vec<TestCase>,
}

impl CycleInputs {
    pub fn new(summary: Summary) -> Self {
        Self {
            summary,
            environment: None,
            history: None,
            test_cases: Vec::new(),
        }
    }
}

/// Build the full snapshot for one cycle. Total over its inputs: never fails.
pub fn aggregate(inputs: &CycleInputs) -> MetricSnapshot {
    let mut snap = MetricSnapshot::new();

    summary_metrics(&mut snap, &inputs.summary);
    if let Some(env) = &inputs.environment {
        environment_metrics(&mut snap, env);
    }
    if let Some(history) = &inputs.history {
        history_metrics(&mut snap, history);
    }
    for tc in &inputs.test_cases {
        test_case_metrics(&mut snap, tc);
    }

    snap
}

fn summary_metrics(snap: &mut MetricSnapshot, summary: &Summary) {
    for status in TestStatus::OUTCOMES {
        snap.set(
            &TESTS_TOTAL,
            &[status.as_str()],
            summary.count(status) as f64,
        );
    }
    snap.set(&SUITE_DURATION, &[], summary.duration_ms as f64 / 1000.0);
}

fn environment_metrics(snap: &mut MetricSnapshot, env: &Environment) {
    for (key, value) in env.iter() {
        snap.set(&ENVIRONMENT_INFO, &[key, value], 1.0);
    }
}

/// Ratio of builds with at least one failure. `None` without history.
pub fn flaky_ratio(history: &HistoryTrend) -> Option<f64> {
    if history.points.is_empty() {
        return None;
    }
    let failing = history.points.iter().filter(|p| p.failed > 0).count();
    Some(failing as f64 / history.points.len() as f64)
}

fn history_metrics(snap: &mut MetricSnapshot, history: &HistoryTrend) {
    for (i, point) in history.points.iter().enumerate() {
        let build = HistoryTrend::build_id(i);
        snap.set(&HISTORY_FAILED, &[&build], point.failed as f64);
    }
    // No history, no ratio: an absent series rather than a misleading 0.
    if let Some(ratio) = flaky_ratio(history) {
        snap.set(&FLAKY_RATIO, &[], ratio);
    }
}

fn test_case_metrics(snap: &mut MetricSnapshot, tc: &TestCase) {
    let seconds = tc.duration_ms() as f64 / 1000.0;
    snap.set(
        &TEST_DURATION,
        &[&tc.name, tc.label_value(label::SUITE)],
        seconds,
    );
    snap.observe(&TEST_DURATION_HISTOGRAM, &[], seconds);

    let passed = if tc.status == TestStatus::Passed { 1.0 } else { 0.0 };
    snap.set(
        &TEST_STATUS,
        &[&tc.name, tc.status.as_str(), tc.label_value(label::SEVERITY)],
        passed,
    );

    let mut steps_by_status: BTreeMap<TestStatus, u64> = BTreeMap::new();
    for step in &tc.steps {
        *steps_by_status.entry(step.status).or_default() += 1;
    }
    for (status, count) in steps_by_status {
        snap.set(&TEST_STEPS, &[&tc.name, status.as_str()], count as f64);
    }

    for tag in tc.tags() {
        snap.inc(&TESTS_BY_LABEL, &[tag.name(), &tag.value]);
    }
}
