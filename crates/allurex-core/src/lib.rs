pub mod error;
pub mod loader;
pub mod model;
pub mod source;
mod wire;

pub use error::{LoadError, LoadErrorKind};
pub use loader::{load, Artifact};
pub use model::{
    Environment, HistoryPoint, HistoryTrend, Label, Step, Summary, TestCase, TestStatus,
};
pub use source::{ArtifactSource, FsSource, MemorySource};
