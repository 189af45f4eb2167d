use std::io;
use std::path::{Path, PathBuf};

use serde_json::error::Category;

/// Coarse classification of a failed artifact load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// The file does not exist.
    Missing,
    /// The file exists but could not be read.
    Unreadable,
    /// The bytes are not valid JSON.
    Malformed,
    /// Valid JSON, but not the expected shape (wrong types, negative counts, ...).
    Invalid,
}

impl LoadErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadErrorKind::Missing => "missing",
            LoadErrorKind::Unreadable => "unreadable",
            LoadErrorKind::Malformed => "malformed",
            LoadErrorKind::Invalid => "invalid",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{}: not found", .path.display())]
    Missing { path: PathBuf },

    #[error("{}: read failed: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: malformed JSON: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: unexpected structure: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    pub(crate) fn from_io(path: &Path, err: io::Error) -> Self {
        let path = path.to_path_buf();
        if err.kind() == io::ErrorKind::NotFound {
            LoadError::Missing { path }
        } else {
            LoadError::Unreadable { path, source: err }
        }
    }

    pub(crate) fn from_json(path: &Path, err: serde_json::Error) -> Self {
        let path = path.to_path_buf();
        match err.classify() {
            Category::Data => LoadError::Invalid { path, source: err },
            Category::Syntax | Category::Eof | Category::Io => {
                LoadError::Malformed { path, source: err }
            }
        }
    }

    pub fn kind(&self) -> LoadErrorKind {
        match self {
            LoadError::Missing { .. } => LoadErrorKind::Missing,
            LoadError::Unreadable { .. } => LoadErrorKind::Unreadable,
            LoadError::Malformed { .. } => LoadErrorKind::Malformed,
            LoadError::Invalid { .. } => LoadErrorKind::Invalid,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            LoadError::Missing { path }
            | LoadError::Unreadable { path, .. }
            | LoadError::Malformed { path, .. }
            | LoadError::Invalid { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_missing() {
        let err = LoadError::from_io(
            Path::new("widgets/summary.json"),
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert_eq!(err.kind(), LoadErrorKind::Missing);
        assert_eq!(err.to_string(), "widgets/summary.json: not found");
    }

    #[test]
    fn permission_denied_is_unreadable() {
        let err = LoadError::from_io(
            Path::new("environment.json"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert_eq!(err.kind(), LoadErrorKind::Unreadable);
    }

    #[test]
    fn json_syntax_vs_shape() {
        let syntax = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = LoadError::from_json(Path::new("a.json"), syntax);
        assert_eq!(err.kind(), LoadErrorKind::Malformed);

        let truncated = serde_json::from_str::<serde_json::Value>("{\"a\": ").unwrap_err();
        let err = LoadError::from_json(Path::new("a.json"), truncated);
        assert_eq!(err.kind(), LoadErrorKind::Malformed);

        let shape = serde_json::from_str::<u64>("-3").unwrap_err();
        let err = LoadError::from_json(Path::new("a.json"), shape);
        assert_eq!(err.kind(), LoadErrorKind::Invalid);
        assert_eq!(err.path(), Path::new("a.json"));
    }
}
