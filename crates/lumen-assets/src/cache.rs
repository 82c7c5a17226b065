//! The id-keyed table of live asset records.

use std::path::Path;

use lumen_core::alloc::HashMap;

use crate::key::{AssetId, AssetKey};
use crate::payload::{AssetKind, AssetPayload};
use crate::source::SourceFile;
use crate::state::LoadState;

/// A cached asset: its identity, source file, payload and dependents.
#[derive(Debug)]
pub struct AssetRecord {
    key: AssetKey,
    source: SourceFile,
    /// Other files read while decoding, e.g. shader stages.
    extra_sources: Vec<SourceFile>,
    payload: AssetPayload,
    state: LoadState,
    /// Ids re-imported when this record changes.
    dependents: Vec<AssetId>,
}

impl AssetRecord {
    /// Create a record in the [`LoadState::Pending`] state.
    pub fn new(key: AssetKey, source: SourceFile, payload: AssetPayload) -> Self {
        Self {
            key,
            source,
            extra_sources: Vec::new(),
            payload,
            state: LoadState::Pending,
            dependents: Vec::new(),
        }
    }

    /// The canonical key of the asset.
    pub fn key(&self) -> &AssetKey {
        &self.key
    }

    /// The source file of the asset.
    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    /// Files besides [`source`](Self::source) that the last decode read.
    pub fn extra_sources(&self) -> &[SourceFile] {
        &self.extra_sources
    }

    pub(crate) fn set_extra_sources(&mut self, sources: Vec<SourceFile>) {
        self.extra_sources = sources;
    }

    pub(crate) fn add_extra_source(&mut self, source: SourceFile) {
        if !self.extra_sources.contains(&source) {
            self.extra_sources.push(source);
        }
    }

    /// The shared payload.
    pub fn payload(&self) -> &AssetPayload {
        &self.payload
    }

    /// The payload kind.
    pub fn kind(&self) -> AssetKind {
        self.payload.kind()
    }

    /// Outcome of the last decode.
    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub(crate) fn set_state(&mut self, state: LoadState) {
        self.state = state;
    }

    /// Ids that require this asset.
    pub fn dependents(&self) -> &[AssetId] {
        &self.dependents
    }

    /// Register `dependent` for change notifications. Returns `false` if it
    /// was already registered.
    pub fn add_dependent(&mut self, dependent: AssetId) -> bool {
        if self.dependents.contains(&dependent) {
            return false;
        }
        self.dependents.push(dependent);
        true
    }

    /// Stop notifying `dependent`. Returns `false` if it was not registered.
    pub fn remove_dependent(&mut self, dependent: AssetId) -> bool {
        let before = self.dependents.len();
        self.dependents.retain(|&id| id != dependent);
        self.dependents.len() != before
    }
}

/// Id-keyed storage of every asset record.
///
/// Records are never evicted; the whole cache is dropped at shutdown.
#[derive(Debug, Default)]
pub struct AssetCache {
    records: HashMap<AssetId, AssetRecord>,
}

impl AssetCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `id` has a record.
    pub fn contains(&self, id: AssetId) -> bool {
        self.records.contains_key(&id)
    }

    /// Get the record of `id`.
    pub fn find(&self, id: AssetId) -> Option<&AssetRecord> {
        self.records.get(&id)
    }

    /// Get the record of `id` mutably.
    pub fn find_mut(&mut self, id: AssetId) -> Option<&mut AssetRecord> {
        self.records.get_mut(&id)
    }

    /// Store `record` under `id`.
    ///
    /// When `id` already has a record of the same kind, the new payload's
    /// content is moved into the existing payload allocation, so outstanding
    /// [`AssetRef`](crate::AssetRef)s observe it. Registered dependents are
    /// kept either way. Returns `true` if the id was new.
    pub fn register(&mut self, id: AssetId, record: AssetRecord) -> bool {
        let Some(existing) = self.records.get_mut(&id) else {
            self.records.insert(id, record);
            return true;
        };

        if !existing.payload.overwrite_from(&record.payload) {
            tracing::warn!(
                "Asset {} ('{}') changed kind from {} to {}, outstanding references are detached",
                id,
                existing.key,
                existing.kind(),
                record.kind()
            );
            existing.payload = record.payload;
        }
        existing.key = record.key;
        existing.source = record.source;
        existing.state = record.state;
        false
    }

    /// Ids of the records whose extra sources include `path`. Compares paths
    /// as given, without touching the filesystem.
    pub fn readers_of<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = AssetId> + 'a {
        self.records
            .iter()
            .filter(move |(_, record)| record.extra_sources.iter().any(|s| s.path() == path))
            .map(|(&id, _)| id)
    }

    /// Iterate all records.
    pub fn iter(&self) -> impl Iterator<Item = (AssetId, &AssetRecord)> {
        self.records.iter().map(|(&id, record)| (id, record))
    }

    /// Get the number of cached records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
