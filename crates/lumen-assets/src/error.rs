//! Error types for the asset pipeline.

use std::fmt;
use std::path::PathBuf;

use crate::key::{AssetId, AssetKey};

/// Errors that can occur inside the asset pipeline.
///
/// Almost all of these are logged and swallowed where they happen; only
/// [`AssetManager::initialize`](crate::AssetManager::initialize) hands one back
/// to the caller.
#[derive(Debug)]
pub enum AssetError {
    /// The source file does not exist.
    NotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// Failed to read the source file.
    Io {
        /// The path that failed to load.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// No importer registered for the file extension.
    MissingImporter {
        /// The file extension, without the dot.
        extension: String,
    },

    /// A declared dependency is not known to the index or not loadable.
    MissingDependency {
        /// The asset that declared the dependency.
        dependent: AssetKey,
        /// The key it asked for.
        key: AssetKey,
    },

    /// The decoder rejected the source data.
    MalformedSource {
        /// The file being decoded.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// `import` was called on an id that already has a record.
    DuplicateImport {
        /// The id that is already cached.
        id: AssetId,
    },

    /// The persisted index document could not be parsed.
    IndexCorruption {
        /// The index document.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The requires-graph contains a cycle through this id.
    CycleDetected {
        /// An id on the cycle.
        id: AssetId,
    },

    /// The file watcher could not be started.
    Watch {
        /// Description of the failure.
        message: String,
    },
}

impl AssetError {
    /// Shorthand for a [`AssetError::MalformedSource`].
    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        AssetError::MalformedSource {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Map an IO failure on `path`, folding `NotFound` into its own variant.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            AssetError::NotFound { path }
        } else {
            AssetError::Io { path, source: err }
        }
    }
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::NotFound { path } => {
                write!(f, "Asset source not found: {}", path.display())
            }
            AssetError::Io { path, source } => {
                write!(f, "IO error reading '{}': {}", path.display(), source)
            }
            AssetError::MissingImporter { extension } => {
                write!(f, "No importer registered for extension: .{}", extension)
            }
            AssetError::MissingDependency { dependent, key } => {
                write!(f, "'{}' requires '{}', which is not available", dependent, key)
            }
            AssetError::MalformedSource { path, message } => {
                write!(f, "Failed to decode '{}': {}", path.display(), message)
            }
            AssetError::DuplicateImport { id } => {
                write!(f, "Asset {} is already imported", id)
            }
            AssetError::IndexCorruption { path, message } => {
                write!(f, "Asset index '{}' is corrupt: {}", path.display(), message)
            }
            AssetError::CycleDetected { id } => {
                write!(f, "Dependency cycle through asset {}", id)
            }
            AssetError::Watch { message } => {
                write!(f, "File watcher error: {}", message)
            }
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for asset operations.
pub type AssetResult<T> = Result<T, AssetError>;
