//! Hot reload support for assets during development.
//!
//! The [`AssetWatcher`] watches the project root on a background thread and
//! posts a [`FileEvent`] per change. The events are plain values; the owner of
//! the [`AssetManager`](crate::AssetManager) applies them with
//! [`process_file_events`](crate::AssetManager::process_file_events).

use std::path::PathBuf;

#[cfg(feature = "hot-reload")]
use std::path::Path;

#[cfg(feature = "hot-reload")]
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

#[cfg(feature = "hot-reload")]
use crate::dispatch::DispatchSender;
use crate::error::AssetError;

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Created,
    Modified,
    Removed,
}

/// A filesystem change, ready to be applied on the owner thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub path: PathBuf,
    pub kind: FileEventKind,
}

impl FileEvent {
    pub fn new(path: impl Into<PathBuf>, kind: FileEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FileEventKind::Modified)
    }
}

/// File watcher for hot-reloading assets.
///
/// Dropping the watcher stops the OS watch.
#[cfg(feature = "hot-reload")]
pub struct AssetWatcher {
    watcher: RecommendedWatcher,
    /// Watched directories
    watched_dirs: Vec<PathBuf>,
}

#[cfg(feature = "hot-reload")]
impl AssetWatcher {
    /// Create a watcher that posts every change to `sender`.
    pub fn new(sender: DispatchSender<FileEvent>) -> Result<Self, AssetError> {
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for file_event in convert(event) {
                    sender.post(file_event);
                }
            }
            Err(e) => tracing::error!("File watcher error: {}", e),
        })
        .map_err(|e| AssetError::Watch {
            message: e.to_string(),
        })?;

        Ok(Self {
            watcher,
            watched_dirs: Vec::new(),
        })
    }

    /// Watch a directory recursively.
    pub fn watch_directory(&mut self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let path = path.as_ref();

        if !self.watched_dirs.iter().any(|dir| dir == path) {
            self.watcher
                .watch(path, RecursiveMode::Recursive)
                .map_err(|e| AssetError::Watch {
                    message: format!("{}: {}", path.display(), e),
                })?;
            self.watched_dirs.push(path.to_path_buf());
            tracing::debug!("Watching directory for changes: {}", path.display());
        }

        Ok(())
    }

    /// Get the list of watched directories.
    pub fn watched_directories(&self) -> &[PathBuf] {
        &self.watched_dirs
    }
}

#[cfg(feature = "hot-reload")]
fn convert(event: Event) -> Vec<FileEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => FileEventKind::Created,
        EventKind::Modify(_) => FileEventKind::Modified,
        EventKind::Remove(_) => FileEventKind::Removed,
        _ => return Vec::new(),
    };
    event
        .paths
        .into_iter()
        .map(|path| FileEvent { path, kind })
        .collect()
}

#[cfg(not(feature = "hot-reload"))]
/// Dummy type when hot-reload feature is disabled.
pub struct AssetWatcher;

#[cfg(not(feature = "hot-reload"))]
impl AssetWatcher {
    pub fn new<T>(_sender: T) -> Result<Self, AssetError> {
        Err(AssetError::Watch {
            message: "Hot reload feature not enabled".to_string(),
        })
    }
}

#[cfg(all(test, feature = "hot-reload"))]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use std::fs;
    use std::thread;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    #[test]
    fn test_convert_maps_kinds() {
        let event = Event::new(EventKind::Create(notify::event::CreateKind::File))
            .add_path(PathBuf::from("/a.lua"))
            .add_path(PathBuf::from("/b.lua"));
        let converted = convert(event);
        assert_eq!(converted.len(), 2);
        assert!(converted.iter().all(|e| e.kind == FileEventKind::Created));

        let access = Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("/a.lua"));
        assert!(convert(access).is_empty());
    }

    #[test]
    fn test_watch_same_directory_twice() {
        let temp_dir = TempDir::new().unwrap();
        let dispatcher = Dispatcher::new();
        let mut watcher = AssetWatcher::new(dispatcher.sender()).unwrap();

        watcher.watch_directory(temp_dir.path()).unwrap();
        watcher.watch_directory(temp_dir.path()).unwrap();

        // Should only have one entry, not two
        assert_eq!(watcher.watched_directories().len(), 1);
    }

    #[test]
    fn test_watch_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let dispatcher = Dispatcher::new();
        let mut watcher = AssetWatcher::new(dispatcher.sender()).unwrap();

        let result = watcher.watch_directory(temp_dir.path().join("missing"));
        assert!(matches!(result, Err(AssetError::Watch { .. })));
    }

    #[test]
    fn test_changes_are_posted() {
        let temp_dir = TempDir::new().unwrap();
        let dispatcher = Dispatcher::new();
        let mut watcher = AssetWatcher::new(dispatcher.sender()).unwrap();
        watcher.watch_directory(temp_dir.path()).unwrap();

        let file_path = temp_dir.path().join("test.lua");
        fs::write(&file_path, "print(1)").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = Vec::new();
        while Instant::now() < deadline {
            seen.extend(dispatcher.drain_all());
            if seen.iter().any(|e| e.path.ends_with("test.lua")) {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }

        assert!(
            seen.iter().any(|e| e.path.ends_with("test.lua") && e.kind != FileEventKind::Removed),
            "no event for test.lua in {:?}",
            seen
        );
    }
}
