//! Metric families for Allure report data, the snapshot that carries one
//! cycle's worth of them, and the guarded store the HTTP layer reads from.

pub mod encode;
pub mod family;
pub mod snapshot;
pub mod store;

pub use encode::{encode_text, Namespace, NamespaceError, CONTENT_TYPE};
pub use family::{FamilyDesc, FamilyKind};
pub use snapshot::{Histogram, MetricFamily, MetricSnapshot, Series};
pub use store::{CycleStats, MetricStore, PublishStatus};
