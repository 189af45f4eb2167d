//! On-disk JSON shapes as Allure writes them. Converted into the
//! normalized types of [`crate::model`] right after decoding.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// `#[serde(default)]` only covers an absent key; this also maps `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ── widgets/summary.json ──

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryWire {
    #[serde(default, deserialize_with = "null_as_default")]
    pub statistic: StatisticWire,
    #[serde(default, deserialize_with = "null_as_default")]
    pub time: SummaryTimeWire,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatisticWire {
    #[serde(default, deserialize_with = "null_as_default")]
    pub passed: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub failed: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub broken: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skipped: u64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SummaryTimeWire {
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: u64,
}

// ── environment.json ──

/// Either the flat `{"key": "value"}` form or Allure's list form
/// `[{"name": "key", "values": ["v1", "v2"]}]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum EnvironmentWire {
    Map(BTreeMap<String, String>),
    List(Vec<EnvironmentEntryWire>),
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnvironmentEntryWire {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub values: Vec<String>,
}

// ── widgets/history-trend.json ──

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum HistoryTrendWire {
    Wrapped {
        #[serde(default, deserialize_with = "null_as_default")]
        items: Vec<HistoryItemWire>,
    },
    Bare(Vec<HistoryItemWire>),
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryItemWire {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: HistoryDataWire,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HistoryDataWire {
    #[serde(default, deserialize_with = "null_as_default")]
    pub failed: u64,
}

// ── data/test-cases/*.json ──

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TestCaseWire {
    #[serde(default, alias = "uid", deserialize_with = "null_as_default")]
    pub uuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub stop: Option<i64>,
    #[serde(default)]
    pub time: Option<TestTimeWire>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<LabelWire>,
    #[serde(default)]
    pub steps: Option<Vec<StepWire>>,
    #[serde(default)]
    pub test_stage: Option<TestStageWire>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TestTimeWire {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub stop: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TestStageWire {
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<StepWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LabelWire {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StepWire {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}
