//! Shared references into the asset cache.
//!
//! The cache owns every record, but renderer, scene and scripts hold
//! [`AssetRef`]s to the payloads. A hot reload writes new content into the
//! same allocation, so a reference taken before the reload observes the new
//! content without being re-resolved.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::payload::Asset;
use crate::state::AssetVersion;

struct AssetCell<T> {
    value: RwLock<T>,
    version: AssetVersion,
}

/// A shared, non-owning reference to an asset payload.
///
/// Cloning is cheap (one atomic increment). Two refs compare equal with
/// [`AssetRef::ptr_eq`] when they point at the same cached payload.
///
/// # Example
///
/// ```ignore
/// let shader: AssetRef<Shader> = manager.get_typed("surface.shader").unwrap();
///
/// // ...the file is edited and the watcher fires...
/// manager.process_file_events();
///
/// // Same reference, fresh content.
/// let stages = shader.read().stages().len();
/// ```
pub struct AssetRef<T: Asset> {
    cell: Arc<AssetCell<T>>,
}

impl<T: Asset> AssetRef<T> {
    /// Wrap a freshly constructed payload.
    pub(crate) fn new(value: T) -> Self {
        Self {
            cell: Arc::new(AssetCell {
                value: RwLock::new(value),
                version: AssetVersion::new(),
            }),
        }
    }

    /// Lock the payload for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.cell.value.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.cell.value.write()
    }

    /// Replace the payload content in place and bump the version.
    pub(crate) fn replace(&self, value: T) -> u32 {
        *self.write() = value;
        self.cell.version.increment()
    }

    /// Move the content out of `other` into this allocation.
    pub(crate) fn take_from(&self, other: &AssetRef<T>) -> u32 {
        if self.ptr_eq(other) {
            return self.version();
        }
        let value = std::mem::take(&mut *other.write());
        self.replace(value)
    }

    /// Number of successful decodes written into this payload.
    pub fn version(&self) -> u32 {
        self.cell.version.get()
    }

    /// Whether both refs point at the same payload allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    /// Number of live references, the cache's own included.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.cell)
    }

    /// Start tracking this ref for changes.
    pub fn tracked(&self) -> TrackedRef<T> {
        TrackedRef::new(self.clone())
    }
}

impl<T: Asset> Clone for AssetRef<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: Asset> std::fmt::Debug for AssetRef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetRef")
            .field("type", &T::type_name())
            .field("version", &self.version())
            .field("refs", &self.ref_count())
            .finish()
    }
}

/// A reference that remembers the version it last saw.
///
/// Useful for systems that need to react to hot reloads without draining the
/// manager's event buffer, e.g. rebuilding a GPU pipeline when its shader
/// changes.
///
/// # Example
///
/// ```ignore
/// let mut tracked = shader.tracked();
///
/// // In the frame loop:
/// if tracked.check_changed() {
///     rebuild_pipeline(&tracked.get().read());
/// }
/// ```
pub struct TrackedRef<T: Asset> {
    asset: AssetRef<T>,
    seen_version: u32,
}

impl<T: Asset> TrackedRef<T> {
    /// Create a tracker that reports the current content as unseen.
    pub fn new(asset: AssetRef<T>) -> Self {
        Self {
            asset,
            seen_version: 0,
        }
    }

    /// The tracked reference.
    pub fn get(&self) -> &AssetRef<T> {
        &self.asset
    }

    /// Get the last seen version.
    pub fn seen_version(&self) -> u32 {
        self.seen_version
    }

    /// Returns `true` if the payload was rewritten since the last check, and
    /// marks the current version as seen.
    pub fn check_changed(&mut self) -> bool {
        let current = self.asset.version();
        if current > self.seen_version {
            self.seen_version = current;
            true
        } else {
            false
        }
    }

    /// Reset the seen version to 0, causing the next check to report a change
    /// for any decoded payload.
    pub fn reset(&mut self) {
        self.seen_version = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::Script;

    fn script(source: &str) -> Script {
        Script::new("test.lua", source)
    }

    #[test]
    fn test_replace_keeps_identity() {
        let asset = AssetRef::new(script("print(1)"));
        let held = asset.clone();
        assert_eq!(asset.version(), 0);

        asset.replace(script("print(2)"));

        assert!(held.ptr_eq(&asset));
        assert_eq!(held.read().source(), "print(2)");
        assert_eq!(held.version(), 1);
    }

    #[test]
    fn test_take_from_moves_content() {
        let cached = AssetRef::new(script("old"));
        let fresh = AssetRef::new(script("new"));

        assert_eq!(cached.take_from(&fresh), 1);
        assert_eq!(cached.read().source(), "new");
        assert_eq!(fresh.read().source(), "");
        assert!(!cached.ptr_eq(&fresh));
    }

    #[test]
    fn test_take_from_self_is_noop() {
        let cached = AssetRef::new(script("same"));
        assert_eq!(cached.take_from(&cached.clone()), 0);
        assert_eq!(cached.read().source(), "same");
    }

    #[test]
    fn test_ref_count() {
        let asset = AssetRef::new(script(""));
        assert_eq!(asset.ref_count(), 1);
        let other = asset.clone();
        assert_eq!(other.ref_count(), 2);
        drop(other);
        assert_eq!(asset.ref_count(), 1);
    }

    #[test]
    fn test_tracked_ref() {
        let asset = AssetRef::new(script("a"));
        let mut tracked = asset.tracked();
        assert!(!tracked.check_changed());

        asset.replace(script("b"));
        assert!(tracked.check_changed());
        assert!(!tracked.check_changed());
        assert_eq!(tracked.seen_version(), 1);

        tracked.reset();
        assert!(tracked.check_changed());
    }
}
