use std::collections::BTreeMap;

use crate::family::{FamilyDesc, FamilyKind, REPORT_FAMILIES};

/// Label values in the order of [`FamilyDesc::labels`].
pub type LabelValues = Vec<String>;

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Per-bucket (non-cumulative) counts; the last slot is the `+Inf` overflow.
    pub counts: Vec<u64>,
    pub sum: f64,
    pub count: u64,
}

impl Histogram {
    fn new(bounds: &[f64]) -> Self {
        Self {
            counts: vec![0; bounds.len() + 1],
            sum: 0.0,
            count: 0,
        }
    }

    fn observe(&mut self, bounds: &[f64], value: f64) {
        let slot = bounds
            .iter()
            .position(|b| value <= *b)
            .unwrap_or(bounds.len());
        self.counts[slot] += 1;
        self.sum += value;
        self.count += 1;
    }

    /// Cumulative counts, one per bound plus `+Inf`.
    pub fn cumulative(&self) -> Vec<u64> {
        self.counts
            .iter()
            .scan(0u64, |acc, c| {
                *acc += c;
                Some(*acc)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    Value(f64),
    Histogram(Histogram),
}

/// One named family and all of its label combinations.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    desc: &'static FamilyDesc,
    series: BTreeMap<LabelValues, Series>,
}

impl MetricFamily {
    pub fn new(desc: &'static FamilyDesc) -> Self {
        Self {
            desc,
            series: BTreeMap::new(),
        }
    }

    pub fn desc(&self) -> &'static FamilyDesc {
        self.desc
    }

    pub fn series(&self) -> impl Iterator<Item = (&LabelValues, &Series)> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn set(&mut self, labels: &[&str], value: f64) {
        self.series.insert(self.key(labels), Series::Value(value));
    }

    pub fn inc(&mut self, labels: &[&str]) {
        let key = self.key(labels);
        match self.series.entry(key).or_insert(Series::Value(0.0)) {
            Series::Value(v) => *v += 1.0,
            Series::Histogram(_) => {
                tracing::error!(family = self.desc.name, "inc on a histogram family");
            }
        }
    }

    pub fn observe(&mut self, labels: &[&str], value: f64) {
        let FamilyKind::Histogram(bounds) = self.desc.kind else {
            tracing::error!(family = self.desc.name, "observe on a non-histogram family");
            return;
        };
        let key = self.key(labels);
        let series = self
            .series
            .entry(key)
            .or_insert_with(|| Series::Histogram(Histogram::new(bounds)));
        if let Series::Histogram(h) = series {
            h.observe(bounds, value);
        }
    }

    pub fn value(&self, labels: &[&str]) -> Option<f64> {
        match self.series.get(&self.key(labels))? {
            Series::Value(v) => Some(*v),
            Series::Histogram(_) => None,
        }
    }

    pub fn histogram(&self, labels: &[&str]) -> Option<&Histogram> {
        match self.series.get(&self.key(labels))? {
            Series::Histogram(h) => Some(h),
            Series::Value(_) => None,
        }
    }

    fn key(&self, labels: &[&str]) -> LabelValues {
        debug_assert_eq!(
            labels.len(),
            self.desc.labels.len(),
            "label arity mismatch for {}",
            self.desc.name
        );
        labels.iter().map(|l| (*l).to_string()).collect()
    }
}

/// A complete set of metric families for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSnapshot {
    families: BTreeMap<&'static str, MetricFamily>,
}

impl Default for MetricSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSnapshot {
    /// Snapshot with every report family registered and empty.
    pub fn new() -> Self {
        let families = REPORT_FAMILIES
            .iter()
            .map(|desc| (desc.name, MetricFamily::new(desc)))
            .collect();
        Self { families }
    }

    /// Family for `desc`, registering it on first use.
    pub fn family_mut(&mut self, desc: &'static FamilyDesc) -> &mut MetricFamily {
        self.families
            .entry(desc.name)
            .or_insert_with(|| MetricFamily::new(desc))
    }

    pub fn family(&self, name: &str) -> Option<&MetricFamily> {
        self.families.get(name)
    }

    pub fn families(&self) -> impl Iterator<Item = &MetricFamily> {
        self.families.values()
    }

    pub fn set(&mut self, desc: &'static FamilyDesc, labels: &[&str], value: f64) {
        self.family_mut(desc).set(labels, value);
    }

    pub fn inc(&mut self, desc: &'static FamilyDesc, labels: &[&str]) {
        self.family_mut(desc).inc(labels);
    }

    pub fn observe(&mut self, desc: &'static FamilyDesc, labels: &[&str], value: f64) {
        self.family_mut(desc).observe(labels, value);
    }

    pub fn value(&self, name: &str, labels: &[&str]) -> Option<f64> {
        self.family(name)?.value(labels)
    }

    /// Take over every label combination of `other`, family by family.
    pub fn absorb(&mut self, other: MetricSnapshot) {
        for (name, family) in other.families {
            let target = self
                .families
                .entry(name)
                .or_insert_with(|| MetricFamily::new(family.desc));
            target.series.extend(family.series);
        }
    }

    /// Number of label combinations across all families.
    pub fn series_count(&self) -> usize {
        self.families.values().map(MetricFamily::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{FLAKY_RATIO, TESTS_BY_LABEL, TESTS_TOTAL, TEST_DURATION_HISTOGRAM};

    #[test]
    fn new_snapshot_registers_report_families_empty() {
        let snap = MetricSnapshot::new();
        assert_eq!(snap.families().count(), REPORT_FAMILIES.len());
        assert_eq!(snap.series_count(), 0);
        assert!(snap.family("flaky_tests_ratio").unwrap().is_empty());
    }

    #[test]
    fn set_overwrites_and_inc_accumulates() {
        let mut snap = MetricSnapshot::new();
        snap.set(&TESTS_TOTAL, &["passed"], 3.0);
        snap.set(&TESTS_TOTAL, &["passed"], 5.0);
        assert_eq!(snap.value("tests_total", &["passed"]), Some(5.0));

        snap.inc(&TESTS_BY_LABEL, &["epic", "payments"]);
        snap.inc(&TESTS_BY_LABEL, &["epic", "payments"]);
        assert_eq!(
            snap.value("tests_by_label", &["epic", "payments"]),
            Some(2.0)
        );
        assert_eq!(snap.value("tests_by_label", &["epic", "search"]), None);
    }

    #[test]
    fn histogram_buckets_are_cumulative() {
        let mut snap = MetricSnapshot::new();
        for v in [0.05, 0.1, 0.7, 12.5, 500.0] {
            snap.observe(&TEST_DURATION_HISTOGRAM, &[], v);
        }
        let h = snap
            .family("test_duration_seconds_histogram")
            .unwrap()
            .histogram(&[])
            .unwrap();
        assert_eq!(h.count, 5);
        assert!((h.sum - 513.35).abs() < 1e-9);
        // bounds: 0.1 0.5 1 2 5 10 30 60 120 +Inf
        assert_eq!(h.cumulative(), vec![2, 2, 3, 3, 3, 3, 4, 4, 4, 5]);
    }

    #[test]
    fn absorb_into_fresh_snapshot_keeps_only_new_series() {
        let mut next = MetricSnapshot::new();
        next.set(&TESTS_TOTAL, &["failed"], 2.0);
        next.set(&FLAKY_RATIO, &[], 0.5);

        let mut fresh = MetricSnapshot::new();
        fresh.absorb(next);

        assert_eq!(fresh.value("tests_total", &["passed"]), None);
        assert_eq!(fresh.value("tests_total", &["failed"]), Some(2.0));
        assert_eq!(fresh.value("flaky_tests_ratio", &[]), Some(0.5));
        assert_eq!(fresh.series_count(), 2);
        assert_eq!(fresh.families().count(), REPORT_FAMILIES.len());
    }
}
