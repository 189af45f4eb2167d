use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use globset::{Glob, GlobMatcher};

/// Report-relative location of the summary widget (required).
pub const SUMMARY_PATH: &str = "widgets/summary.json";
/// Report-relative location of the environment dump (optional).
pub const ENVIRONMENT_PATH: &str = "environment.json";
/// Report-relative location of the history trend widget (optional).
pub const HISTORY_TREND_PATH: &str = "widgets/history-trend.json";
/// Directory holding one JSON file per test case.
pub const TEST_CASES_DIR: &str = "data/test-cases";

const TEST_CASE_PATTERN: &str = "*.json";

/// Where report artifacts come from.
///
/// All paths are relative to the report root. Implemented by [`FsSource`]
/// for a real directory and by [`MemorySource`] for tests.
pub trait ArtifactSource: Send + Sync {
    /// Read the raw bytes of one artifact.
    fn read(&self, rel: &Path) -> io::Result<Vec<u8>>;

    /// List the test-case artifacts, sorted, as report-relative paths.
    ///
    /// An absent test-case directory is an empty list, not an error.
    fn list_test_cases(&self) -> io::Result<Vec<PathBuf>>;

    /// Human-readable description for log lines.
    fn describe(&self) -> String;
}

fn test_case_matcher() -> io::Result<GlobMatcher> {
    Glob::new(TEST_CASE_PATTERN)
        .map(|g| g.compile_matcher())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

// ── Filesystem ──

/// Report directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArtifactSource for FsSource {
    fn read(&self, rel: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(rel))
    }

    fn list_test_cases(&self) -> io::Result<Vec<PathBuf>> {
        let dir = self.root.join(TEST_CASES_DIR);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e),
        };

        let matcher = test_case_matcher()?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            if !matcher.is_match(Path::new(&name)) {
                continue;
            }
            // Follows symlinks; a dangling link is not a file.
            if entry.path().is_file() {
                files.push(Path::new(TEST_CASES_DIR).join(name));
            } else {
                tracing::debug!(path = %entry.path().display(), "not a regular file; ignored");
            }
        }
        files.sort();
        Ok(files)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

// ── In-memory ──

/// Mutable in-memory report, for exercising the pipeline without a disk.
#[derive(Debug)]
pub struct MemorySource {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    listing_error: Mutex<Option<io::ErrorKind>>,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            listing_error: Mutex::new(None),
        }
    }

    pub fn insert(&self, rel: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(rel.into(), contents.into());
    }

    pub fn remove(&self, rel: impl AsRef<Path>) -> bool {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(rel.as_ref())
            .is_some()
    }

    /// Make `list_test_cases` fail with `kind` until cleared with `None`.
    pub fn fail_listing(&self, kind: Option<io::ErrorKind>) {
        *self
            .listing_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = kind;
    }
}

impl ArtifactSource for MemorySource {
    fn read(&self, rel: &Path) -> io::Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(rel)
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn list_test_cases(&self) -> io::Result<Vec<PathBuf>> {
        if let Some(kind) = *self
            .listing_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
        {
            return Err(io::Error::from(kind));
        }
        let matcher = test_case_matcher()?;
        let files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(files
            .keys()
            .filter(|p| p.parent() == Some(Path::new(TEST_CASES_DIR)))
            .filter(|p| p.file_name().is_some_and(|n| matcher.is_match(n)))
            .cloned()
            .collect())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}
