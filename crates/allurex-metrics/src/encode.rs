//! Prometheus text exposition format (version 0.0.4).

use std::fmt::Write as _;
use std::sync::LazyLock;
use std::time::UNIX_EPOCH;

use regex::Regex;

use crate::family::{
    FamilyDesc, FamilyKind, LAST_UPDATE_DURATION, LAST_UPDATE_TIME, SKIPPED_TEST_CASES,
    UPDATE_ERRORS, UPDATE_SUCCESS,
};
use crate::snapshot::{MetricFamily, MetricSnapshot, Series};
use crate::store::PublishStatus;

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

// ── Namespace ──

static VALID_NAMESPACE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$"));

#[derive(Debug, thiserror::Error)]
pub enum NamespaceError {
    #[error("invalid metric namespace {0:?}: must match [a-zA-Z_][a-zA-Z0-9_]*")]
    Invalid(String),

    #[error("namespace pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Metric name prefix. Empty means no prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Namespace(String);

impl Namespace {
    pub fn parse(raw: &str) -> Result<Self, NamespaceError> {
        if raw.is_empty() {
            return Ok(Self::default());
        }
        let valid = (*VALID_NAMESPACE).as_ref().map_err(Clone::clone)?;
        if valid.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(NamespaceError::Invalid(raw.to_string()))
        }
    }

    pub fn qualify(&self, name: &str) -> String {
        if self.0.is_empty() {
            name.to_string()
        } else {
            format!("{}_{name}", self.0)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ── Encoding ──

/// Render the report snapshot followed by the exporter's own families.
/// Families without series are omitted.
pub fn encode_text(ns: &Namespace, snapshot: &MetricSnapshot, status: &PublishStatus) -> String {
    let mut out = String::new();
    for family in snapshot.families() {
        write_family(&mut out, ns, family);
    }
    for family in exporter_families(status) {
        write_family(&mut out, ns, &family);
    }
    out
}

fn exporter_families(status: &PublishStatus) -> Vec<MetricFamily> {
    let mut families = Vec::new();
    let mut single = |desc: &'static FamilyDesc, value: f64| {
        let mut family = MetricFamily::new(desc);
        family.set(&[], value);
        families.push(family);
    };

    single(&UPDATE_SUCCESS, status.successes as f64);
    single(&UPDATE_ERRORS, status.failures as f64);
    if let Some(last) = &status.last_success {
        let unix = last
            .finished_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        single(&LAST_UPDATE_TIME, unix);
        single(&LAST_UPDATE_DURATION, last.elapsed.as_secs_f64());
        single(&SKIPPED_TEST_CASES, last.skipped_test_cases as f64);
    }
    families
}

fn write_family(out: &mut String, ns: &Namespace, family: &MetricFamily) {
    if family.is_empty() {
        return;
    }
    let desc = family.desc();
    let name = ns.qualify(desc.name);
    let _ = writeln!(out, "# HELP {name} {}", escape_help(desc.help));
    let _ = writeln!(out, "# TYPE {name} {}", desc.kind.type_name());

    for (values, series) in family.series() {
        match series {
            Series::Value(v) => {
                let labels = render_labels(desc.labels, values, None);
                let _ = writeln!(out, "{name}{labels} {}", format_value(*v));
            }
            Series::Histogram(h) => {
                let FamilyKind::Histogram(bounds) = desc.kind else {
                    continue;
                };
                let cumulative = h.cumulative();
                let les = bounds
                    .iter()
                    .map(|b| format_value(*b))
                    .chain(std::iter::once("+Inf".to_string()));
                for (le, count) in les.zip(cumulative) {
                    let labels = render_labels(desc.labels, values, Some(&le));
                    let _ = writeln!(out, "{name}_bucket{labels} {count}");
                }
                let labels = render_labels(desc.labels, values, None);
                let _ = writeln!(out, "{name}_sum{labels} {}", format_value(h.sum));
                let _ = writeln!(out, "{name}_count{labels} {}", h.count);
            }
        }
    }
}

fn render_labels(names: &[&str], values: &[String], le: Option<&str>) -> String {
    let mut pairs: Vec<String> = names
        .iter()
        .zip(values)
        .map(|(n, v)| format!("{n}=\"{}\"", escape_label_value(v)))
        .collect();
    if let Some(le) = le {
        pairs.push(format!("le=\"{le}\""));
    }
    if pairs.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", pairs.join(","))
    }
}

fn escape_label_value(v: &str) -> String {
    v.replace('\\', r"\\")
        .replace('"', "\\\"")
        .replace('\n', r"\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', r"\\").replace('\n', r"\n")
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        String::from(if v > 0.0 { "+Inf" } else { "-Inf" })
    } else {
        v.to_string()
    }
}
