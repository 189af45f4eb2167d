use std::collections::BTreeMap;

use crate::loader::Artifact;
use crate::wire::{
    EnvironmentWire, HistoryTrendWire, LabelWire, StepWire, SummaryWire, TestCaseWire,
};

/// Fallback for a label a test case does not carry.
pub const UNKNOWN: &str = "unknown";

/// Canonical (lower-cased) label names with a semantic role.
pub mod label {
    pub const SUITE: &str = "suite";
    pub const SEVERITY: &str = "severity";

    /// Label types that take part in tag grouping.
    pub const TAG_TYPES: [&str; 6] = ["epic", "feature", "story", "severity", "owner", "layer"];
}

// ── Status ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestStatus {
    Passed,
    Failed,
    Broken,
    Skipped,
    Unknown,
}

impl TestStatus {
    /// The outcomes counted by the summary widget.
    pub const OUTCOMES: [TestStatus; 4] = [
        TestStatus::Passed,
        TestStatus::Failed,
        TestStatus::Broken,
        TestStatus::Skipped,
    ];

    /// Exact match only: `"PASSED"` or `"pass"` are `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "passed" => TestStatus::Passed,
            "failed" => TestStatus::Failed,
            "broken" => TestStatus::Broken,
            "skipped" => TestStatus::Skipped,
            _ => TestStatus::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Broken => "broken",
            TestStatus::Skipped => "skipped",
            TestStatus::Unknown => "unknown",
        }
    }

    fn from_wire(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or(TestStatus::Unknown)
    }
}

// ── Summary ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub passed: u64,
    pub failed: u64,
    pub broken: u64,
    pub skipped: u64,
    pub duration_ms: u64,
}

impl Summary {
    /// Count for one of [`TestStatus::OUTCOMES`]; `Unknown` has no summary count.
    pub fn count(&self, status: TestStatus) -> u64 {
        match status {
            TestStatus::Passed => self.passed,
            TestStatus::Failed => self.failed,
            TestStatus::Broken => self.broken,
            TestStatus::Skipped => self.skipped,
            TestStatus::Unknown => 0,
        }
    }
}

impl From<SummaryWire> for Summary {
    fn from(w: SummaryWire) -> Self {
        Self {
            passed: w.statistic.passed,
            failed: w.statistic.failed,
            broken: w.statistic.broken,
            skipped: w.statistic.skipped,
            duration_ms: w.time.duration,
        }
    }
}

impl Artifact for Summary {
    const NAME: &'static str = "summary";

    fn decode(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice::<SummaryWire>(bytes).map(Into::into)
    }
}

// ── Environment ──

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    entries: BTreeMap<String, String>,
}

impl Environment {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl From<EnvironmentWire> for Environment {
    fn from(w: EnvironmentWire) -> Self {
        let entries = match w {
            EnvironmentWire::Map(map) => map,
            EnvironmentWire::List(list) => list
                .into_iter()
                .map(|e| (e.name, e.values.join(",")))
                .collect(),
        };
        Self { entries }
    }
}

impl Artifact for Environment {
    const NAME: &'static str = "environment";

    fn decode(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice::<EnvironmentWire>(bytes).map(Into::into)
    }
}

// ── History trend ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryPoint {
    pub failed: u64,
}

/// Per-build history, most recent first as Allure writes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryTrend {
    pub points: Vec<HistoryPoint>,
}

impl HistoryTrend {
    /// Stable identifier for the point at `index`.
    pub fn build_id(index: usize) -> String {
        format!("build_{index}")
    }
}

impl From<HistoryTrendWire> for HistoryTrend {
    fn from(w: HistoryTrendWire) -> Self {
        let items = match w {
            HistoryTrendWire::Wrapped { items } => items,
            HistoryTrendWire::Bare(items) => items,
        };
        Self {
            points: items
                .into_iter()
                .map(|i| HistoryPoint {
                    failed: i.data.failed,
                })
                .collect(),
        }
    }
}

impl Artifact for HistoryTrend {
    const NAME: &'static str = "history-trend";

    fn decode(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice::<HistoryTrendWire>(bytes).map(Into::into)
    }
}

// ── Test case ──

/// A label with its name folded to lower case at ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_lowercase(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_tag(&self) -> bool {
        label::TAG_TYPES.contains(&self.name.as_str())
    }
}

impl From<LabelWire> for Label {
    fn from(w: LabelWire) -> Self {
        Label::new(&w.name, w.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub status: TestStatus,
}

impl From<StepWire> for Step {
    fn from(w: StepWire) -> Self {
        Self {
            name: w.name,
            status: TestStatus::from_wire(w.status.as_deref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub id: String,
    /// Display name; not unique across test cases.
    pub name: String,
    pub status: TestStatus,
    pub start_ms: i64,
    pub stop_ms: i64,
    pub labels: Vec<Label>,
    pub steps: Vec<Step>,
}

impl TestCase {
    /// Wall time in milliseconds, clamped to zero when stop precedes start.
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.stop_ms.saturating_sub(self.start_ms)).unwrap_or(0)
    }

    /// True when the recorded stop precedes the start.
    pub fn timing_inverted(&self) -> bool {
        self.stop_ms < self.start_ms
    }

    /// Value of the first label named `name` (case-insensitive), or `"unknown"`.
    pub fn label_value(&self, name: &str) -> &str {
        let name = name.to_lowercase();
        self.labels
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.value.as_str())
            .unwrap_or(UNKNOWN)
    }

    /// Labels that participate in tag grouping.
    pub fn tags(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter().filter(|l| l.is_tag())
    }
}

impl From<TestCaseWire> for TestCase {
    fn from(w: TestCaseWire) -> Self {
        let time = w.time.unwrap_or_default();
        let steps = match (w.steps, w.test_stage) {
            (Some(steps), _) => steps,
            (None, Some(stage)) => stage.steps,
            (None, None) => Vec::new(),
        };
        Self {
            id: w.uuid,
            name: w.name,
            status: TestStatus::from_wire(w.status.as_deref()),
            start_ms: w.start.or(time.start).unwrap_or(0),
            stop_ms: w.stop.or(time.stop).unwrap_or(0),
            labels: w.labels.into_iter().map(Label::from).collect(),
            steps: steps.into_iter().map(Step::from).collect(),
        }
    }
}

impl Artifact for TestCase {
    const NAME: &'static str = "test-case";

    fn decode(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice::<TestCaseWire>(bytes).map(Into::into)
    }
}
