//! The catalogue of exported metric families.
//!
//! Names are given without the namespace prefix; the encoder adds
//! `<namespace>_` at exposition time.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FamilyKind {
    Gauge,
    Counter,
    /// Cumulative histogram with the given upper bounds (`+Inf` implied).
    Histogram(&'static [f64]),
}

impl FamilyKind {
    pub fn type_name(self) -> &'static str {
        match self {
            FamilyKind::Gauge => "gauge",
            FamilyKind::Counter => "counter",
            FamilyKind::Histogram(_) => "histogram",
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct FamilyDesc {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: FamilyKind,
    pub labels: &'static [&'static str],
}

// ── Report families (rebuilt every cycle) ──

pub const TESTS_TOTAL: FamilyDesc = FamilyDesc {
    name: "tests_total",
    help: "Total tests by status",
    kind: FamilyKind::Gauge,
    labels: &["status"],
};

pub const SUITE_DURATION: FamilyDesc = FamilyDesc {
    name: "suite_duration_seconds",
    help: "Test suite duration",
    kind: FamilyKind::Gauge,
    labels: &[],
};

pub const TEST_DURATION: FamilyDesc = FamilyDesc {
    name: "test_duration_seconds",
    help: "Individual test duration",
    kind: FamilyKind::Gauge,
    labels: &["name", "suite"],
};

pub const TEST_DURATION_BUCKETS: &[f64] = &[0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0];

pub const TEST_DURATION_HISTOGRAM: FamilyDesc = FamilyDesc {
    name: "test_duration_seconds_histogram",
    help: "Test duration distribution",
    kind: FamilyKind::Histogram(TEST_DURATION_BUCKETS),
    labels: &[],
};

pub const TEST_STATUS: FamilyDesc = FamilyDesc {
    name: "test_status",
    help: "Test status (1-passed, 0-anything else)",
    kind: FamilyKind::Gauge,
    labels: &["name", "status", "severity"],
};

pub const TEST_STEPS: FamilyDesc = FamilyDesc {
    name: "test_steps_total",
    help: "Test steps by status",
    kind: FamilyKind::Gauge,
    labels: &["test_name", "status"],
};

pub const ENVIRONMENT_INFO: FamilyDesc = FamilyDesc {
    name: "environment_info",
    help: "Test environment information",
    kind: FamilyKind::Gauge,
    labels: &["key", "value"],
};

pub const HISTORY_FAILED: FamilyDesc = FamilyDesc {
    name: "history_failed_tests",
    help: "Failed tests history trend",
    kind: FamilyKind::Gauge,
    labels: &["build"],
};

pub const FLAKY_RATIO: FamilyDesc = FamilyDesc {
    name: "flaky_tests_ratio",
    help: "Fraction of history builds with at least one failed test",
    kind: FamilyKind::Gauge,
    labels: &[],
};

pub const TESTS_BY_LABEL: FamilyDesc = FamilyDesc {
    name: "tests_by_label",
    help: "Tests grouped by label",
    kind: FamilyKind::Gauge,
    labels: &["label_type", "label_value"],
};

/// Every family a report snapshot may populate.
pub const REPORT_FAMILIES: &[&FamilyDesc] = &[
    &TESTS_TOTAL,
    &SUITE_DURATION,
    &TEST_DURATION,
    &TEST_DURATION_HISTOGRAM,
    &TEST_STATUS,
    &TEST_STEPS,
    &ENVIRONMENT_INFO,
    &HISTORY_FAILED,
    &FLAKY_RATIO,
    &TESTS_BY_LABEL,
];

// ── Exporter families (process lifetime, never reset) ──

pub const UPDATE_SUCCESS: FamilyDesc = FamilyDesc {
    name: "update_success_total",
    help: "Total number of successful updates",
    kind: FamilyKind::Counter,
    labels: &[],
};

pub const UPDATE_ERRORS: FamilyDesc = FamilyDesc {
    name: "update_errors_total",
    help: "Total number of update errors",
    kind: FamilyKind::Counter,
    labels: &[],
};

pub const LAST_UPDATE_TIME: FamilyDesc = FamilyDesc {
    name: "last_update_time",
    help: "Last successful update time (Unix timestamp)",
    kind: FamilyKind::Gauge,
    labels: &[],
};

pub const LAST_UPDATE_DURATION: FamilyDesc = FamilyDesc {
    name: "last_update_duration_seconds",
    help: "Wall time of the last successful update",
    kind: FamilyKind::Gauge,
    labels: &[],
};

pub const SKIPPED_TEST_CASES: FamilyDesc = FamilyDesc {
    name: "skipped_test_cases",
    help: "Test case files skipped in the last successful update",
    kind: FamilyKind::Gauge,
    labels: &[],
};
