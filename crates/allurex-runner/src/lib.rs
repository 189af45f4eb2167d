//! The exporter's worker side: one cycle loads the report, aggregates it
//! and publishes the result; the scheduler repeats that on an interval and
//! the health reporter judges how fresh the published data is.

pub mod config;
pub mod health;
pub mod orchestrator;
pub mod scheduler;

pub use config::{ConfigError, ExporterConfig};
pub use health::{Health, HealthReporter};
pub use orchestrator::{CycleError, CycleReport, Orchestrator};
pub use scheduler::{CycleRun, Scheduler, SchedulerHandle};
