//! The persistent identity index (`resources.json`).
//!
//! Holds the `key → id` and `id → path` maps, the requires-graph and the
//! eager-load set. The whole document is rewritten on every save; there is no
//! incremental or atomic write.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AssetError, AssetResult};
use crate::key::{AssetId, AssetKey};

/// Default file name of the index document at the project root.
pub const DEFAULT_INDEX_FILE: &str = "resources.json";

/// Durable mapping between keys, ids, paths and dependency edges.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AssetIndex {
    /// Root-relative source path of every known id, `/`-separated.
    #[serde(default)]
    id_path: BTreeMap<AssetId, String>,
    #[serde(default)]
    key_id: BTreeMap<AssetKey, AssetId>,
    /// `dependent → [required]` edges.
    #[serde(default)]
    requires: BTreeMap<AssetId, Vec<AssetId>>,
    #[serde(default)]
    no_lazy_load: Vec<AssetId>,
    #[serde(skip)]
    dirty: bool,
}

impl AssetIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the index document, or start empty when it does not exist.
    ///
    /// A document that exists but fails to parse is reported as
    /// [`AssetError::IndexCorruption`].
    pub fn load(path: impl AsRef<Path>) -> AssetResult<Self> {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No asset index at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(err) => return Err(AssetError::io(path, err)),
        };

        let index: AssetIndex =
            serde_json::from_slice(&bytes).map_err(|e| AssetError::IndexCorruption {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        tracing::debug!(
            "Loaded asset index {} ({} ids, {} edges, {} eager)",
            path.display(),
            index.id_path.len(),
            index.requires.values().map(Vec::len).sum::<usize>(),
            index.no_lazy_load.len()
        );
        Ok(index)
    }

    /// Write the whole index document.
    pub fn save(&mut self, path: impl AsRef<Path>) -> AssetResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| AssetError::Io { path: path.to_path_buf(), source: e.into() })?;
        std::fs::write(path, json).map_err(|e| AssetError::io(path, e))?;
        self.dirty = false;
        tracing::debug!("Saved asset index {}", path.display());
        Ok(())
    }

    /// Look up the id of a key without allocating one.
    pub fn id_of(&self, key: &AssetKey) -> Option<AssetId> {
        self.key_id.get(key).copied()
    }

    /// Return the id of `key`, allocating and recording a fresh one if the key
    /// is new. `path` is the root-relative source path.
    pub fn id_for(&mut self, key: &AssetKey, path: &Path) -> AssetId {
        if let Some(id) = self.id_of(key) {
            if !self.id_path.contains_key(&id) {
                self.id_path.insert(id, path_string(path));
                self.dirty = true;
            }
            return id;
        }

        let id = loop {
            let candidate = AssetId::random();
            if !self.id_path.contains_key(&candidate) {
                break candidate;
            }
        };

        self.key_id.insert(key.clone(), id);
        self.id_path.insert(id, path_string(path));
        self.dirty = true;
        tracing::trace!("Assigned id {} to '{}'", id, key);
        id
    }

    /// Root-relative source path of `id`, if known.
    pub fn path_for(&self, id: AssetId) -> Option<&Path> {
        self.id_path.get(&id).map(Path::new)
    }

    /// Reverse lookup of the key that owns `id`.
    pub fn key_for(&self, id: AssetId) -> Option<&AssetKey> {
        self.key_id
            .iter()
            .find_map(|(key, &candidate)| (candidate == id).then_some(key))
    }

    /// Ids that `id` requires to be loaded first.
    pub fn requires(&self, id: AssetId) -> &[AssetId] {
        self.requires.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate every `dependent → required` edge.
    pub fn edges(&self) -> impl Iterator<Item = (AssetId, AssetId)> + '_ {
        self.requires
            .iter()
            .flat_map(|(&dependent, required)| required.iter().map(move |&r| (dependent, r)))
    }

    /// Record that `dependent` requires `required`. Returns `false` if the
    /// edge was already present.
    pub fn add_requirement(&mut self, dependent: AssetId, required: AssetId) -> bool {
        let edges = self.requires.entry(dependent).or_default();
        if edges.contains(&required) {
            return false;
        }
        edges.push(required);
        self.dirty = true;
        true
    }

    /// Drop every requirement of `dependent`, returning the removed ids.
    pub fn clear_requirements(&mut self, dependent: AssetId) -> Vec<AssetId> {
        let removed = self.requires.remove(&dependent).unwrap_or_default();
        if !removed.is_empty() {
            self.dirty = true;
        }
        removed
    }

    /// Ids forced resident at startup.
    pub fn no_lazy_load(&self) -> &[AssetId] {
        &self.no_lazy_load
    }

    /// Add `id` to the eager-load set. Returns `false` if already present.
    pub fn mark_no_lazy_load(&mut self, id: AssetId) -> bool {
        if self.no_lazy_load.contains(&id) {
            return false;
        }
        self.no_lazy_load.push(id);
        self.dirty = true;
        true
    }

    /// Drop entries that break the index invariants: keys sharing an id,
    /// keys or edges naming ids without a path, eager ids without a path.
    ///
    /// Returns the number of entries removed.
    pub fn validate(&mut self) -> usize {
        let mut removed = 0;

        let mut claimed = BTreeSet::new();
        let id_path = &self.id_path;
        self.key_id.retain(|key, id| {
            if !id_path.contains_key(id) {
                tracing::warn!("Index key '{}' names id {} without a path, dropping", key, id);
                removed += 1;
                false
            } else if !claimed.insert(*id) {
                tracing::warn!("Index key '{}' reuses id {}, dropping", key, id);
                removed += 1;
                false
            } else {
                true
            }
        });

        self.requires.retain(|dependent, required| {
            if !id_path.contains_key(dependent) {
                tracing::warn!("Index edge from unknown id {}, dropping", dependent);
                removed += required.len();
                return false;
            }
            required.retain(|id| {
                let known = id_path.contains_key(id);
                if !known {
                    tracing::warn!("Index edge {} -> {} names an unknown id, dropping", dependent, id);
                    removed += 1;
                }
                known
            });
            !required.is_empty()
        });

        self.no_lazy_load.retain(|id| {
            let known = id_path.contains_key(id);
            if !known {
                tracing::warn!("Eager-load id {} has no path, dropping", id);
                removed += 1;
            }
            known
        });

        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// Iterate `(key, id)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&AssetKey, AssetId)> {
        self.key_id.iter().map(|(key, &id)| (key, id))
    }

    /// Number of keys in the index.
    pub fn len(&self) -> usize {
        self.key_id.len()
    }

    /// Whether the index holds no keys.
    pub fn is_empty(&self) -> bool {
        self.key_id.is_empty()
    }

    /// Whether the index changed since it was loaded or last saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

fn path_string(path: &Path) -> String {
    let path: PathBuf = path.components().collect();
    path.to_string_lossy().replace('\\', "/")
}
