//! Source files backing asset records.

use std::path::{Path, PathBuf};

use crate::error::{AssetError, AssetResult};

/// The on-disk source of an asset record.
///
/// Change notifications for the file arrive through the
/// [`AssetWatcher`](crate::hot_reload::AssetWatcher); this type only knows how
/// to find and read the file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
    path: PathBuf,
}

impl SourceFile {
    /// Create a source for an absolute path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The absolute path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File extension (without the dot), if any.
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }

    /// Check if the file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the whole file synchronously.
    pub fn read(&self) -> AssetResult<Vec<u8>> {
        std::fs::read(&self.path).map_err(|e| AssetError::io(&self.path, e))
    }

    /// Whether a watcher-reported path refers to this file.
    pub fn matches(&self, path: &Path) -> bool {
        if self.path == path {
            return true;
        }
        match (std::fs::canonicalize(&self.path), std::fs::canonicalize(path)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl std::fmt::Display for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
