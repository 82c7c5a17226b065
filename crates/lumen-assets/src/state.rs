//! Load state and version tracking for asset records.

use std::sync::atomic::{AtomicU32, Ordering};

/// Outcome of the most recent decode of an asset record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Registered but not decoded yet.
    #[default]
    Pending,

    /// The last decode succeeded.
    Loaded,

    /// The last decode failed; the payload holds default or previous content.
    Failed(String),
}

impl LoadState {
    /// Returns `true` if the last decode succeeded.
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadState::Loaded)
    }

    /// Returns `true` if the last decode failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, LoadState::Failed(_))
    }

    /// Get the error message if the last decode failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Version tracker for change detection.
///
/// Starts at 0 for a default-constructed payload and increments each time a
/// decode writes new content.
#[derive(Debug, Default)]
pub struct AssetVersion {
    value: AtomicU32,
}

impl AssetVersion {
    /// Create a new version starting at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current version number.
    pub fn get(&self) -> u32 {
        self.value.load(Ordering::Acquire)
    }

    /// Increment the version and return the new value.
    pub fn increment(&self) -> u32 {
        self.value.fetch_add(1, Ordering::AcqRel) + 1
    }
}
