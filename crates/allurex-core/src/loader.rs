use std::path::Path;

use crate::error::LoadError;
use crate::source::ArtifactSource;

/// A report artifact that can be decoded from raw JSON bytes.
pub trait Artifact: Sized {
    /// Short name used in logs and error-count labels.
    const NAME: &'static str;

    fn decode(bytes: &[u8]) -> serde_json::Result<Self>;
}

/// Read and decode one artifact. A single attempt: no retries, no caching.
pub fn load<A: Artifact>(source: &dyn ArtifactSource, rel: &Path) -> Result<A, LoadError> {
    let bytes = source.read(rel).map_err(|e| LoadError::from_io(rel, e))?;
    let artifact = A::decode(&bytes).map_err(|e| LoadError::from_json(rel, e))?;
    tracing::debug!(artifact = A::NAME, path = %rel.display(), bytes = bytes.len(), "artifact loaded");
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadErrorKind;
    use crate::model::{Environment, Summary, TestCase};
    use crate::source::{FsSource, MemorySource, ENVIRONMENT_PATH, SUMMARY_PATH};

    #[test]
    fn missing_file_is_classified() {
        let source = MemorySource::new();
        let err = load::<Summary>(&source, Path::new(SUMMARY_PATH)).unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::Missing);
        assert_eq!(err.path(), Path::new(SUMMARY_PATH));
    }

    #[test]
    fn garbage_is_malformed_and_wrong_shape_is_invalid() {
        let source = MemorySource::new();
        source.insert(SUMMARY_PATH, "{\"statistic\": {");
        let err = load::<Summary>(&source, Path::new(SUMMARY_PATH)).unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::Malformed);

        source.insert(SUMMARY_PATH, "[1, 2, 3]");
        let err = load::<Summary>(&source, Path::new(SUMMARY_PATH)).unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::Invalid);

        source.insert(ENVIRONMENT_PATH, "\"just a string\"");
        let err = load::<Environment>(&source, Path::new(ENVIRONMENT_PATH)).unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::Invalid);
    }

    #[test]
    fn loads_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("data/test-cases");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("t1.json"),
            r#"{"uuid": "1", "name": "t1", "status": "failed", "start": 0, "stop": 250}"#,
        )
        .unwrap();

        let source = FsSource::new(tmp.path());
        let rel = &source.list_test_cases().unwrap()[0];
        let tc = load::<TestCase>(&source, rel).unwrap();
        assert_eq!(tc.name, "t1");
        assert_eq!(tc.duration_ms(), 250);
    }
}
