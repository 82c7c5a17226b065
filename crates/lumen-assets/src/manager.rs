//! Asset manager - the owner of every pipeline component.

use std::path::{Path, PathBuf};

use lumen_core::profiling::profile_function;

use crate::cache::AssetCache;
use crate::config::AssetConfig;
use crate::dispatch::{DispatchSender, Dispatcher};
use crate::eager;
use crate::error::{AssetError, AssetResult};
use crate::event::{AssetEvent, AssetEventBuffer};
use crate::handle::AssetRef;
use crate::hot_reload::{FileEvent, FileEventKind};
use crate::importer::{AssetImporter, ImportEnv, ImporterRegistry};
use crate::index::AssetIndex;
use crate::key::{AssetId, AssetKey, canonicalize};
use crate::kinds;
use crate::payload::{Asset, AssetPayload};
use crate::resolver;
use crate::scan;

/// The asset pipeline of one project root.
///
/// Owned by the application and driven from one thread: every method that
/// touches the cache or the index takes `&mut self`. Other threads interact
/// through [`AssetRef`]s and the [`dispatcher`](Self::dispatcher) sender.
///
/// # Example
///
/// ```ignore
/// let mut assets = AssetManager::new(AssetConfig::new("assets"));
/// assets.register_default_importers();
/// assets.initialize()?;
///
/// let material: AssetRef<Material> = assets.get_typed("standard.standard.mat").unwrap();
///
/// loop {
///     // Apply file changes picked up by the watcher.
///     assets.process_file_events();
///     for event in assets.drain_events() {
///         // React to reloads
///     }
/// #   break;
/// }
///
/// assets.shutdown();
/// ```
pub struct AssetManager {
    config: AssetConfig,
    root: PathBuf,
    registry: ImporterRegistry,
    cache: AssetCache,
    index: AssetIndex,
    events: AssetEventBuffer,
    file_events: Dispatcher<FileEvent>,
    #[cfg(feature = "hot-reload")]
    watcher: Option<crate::hot_reload::AssetWatcher>,
    initialized: bool,
}

impl AssetManager {
    /// Create a manager with no importers registered.
    pub fn new(config: AssetConfig) -> Self {
        Self {
            root: config.root.clone(),
            config,
            registry: ImporterRegistry::new(),
            cache: AssetCache::new(),
            index: AssetIndex::new(),
            events: AssetEventBuffer::new(),
            file_events: Dispatcher::new(),
            #[cfg(feature = "hot-reload")]
            watcher: None,
            initialized: false,
        }
    }

    /// Register an importer for its declared extensions.
    pub fn register_importer<I: AssetImporter>(&mut self, importer: I) {
        self.registry.register(importer);
    }

    /// Register an importer for an explicit list of extensions.
    pub fn register_importer_for<I: AssetImporter>(&mut self, extensions: &[&str], importer: I) {
        self.registry.register_for(extensions, importer);
    }

    /// Register the importers of all built-in kinds.
    pub fn register_default_importers(&mut self) {
        kinds::register_defaults(&mut self.registry);
    }

    /// Load the index, scan the root, load eager assets and start watching.
    ///
    /// Fails only when the index document exists but cannot be parsed; the
    /// manager refuses to run rather than overwrite persisted ids.
    pub fn initialize(&mut self) -> AssetResult<()> {
        profile_function!();

        if self.initialized {
            tracing::warn!("Asset manager for {} is already initialized", self.root.display());
            return Ok(());
        }

        self.root = std::fs::canonicalize(&self.config.root).unwrap_or_else(|e| {
            tracing::warn!("Cannot resolve asset root {}: {}", self.config.root.display(), e);
            self.config.root.clone()
        });
        let index_path = self.root.join(&self.config.index_file);

        let mut index = AssetIndex::load(&index_path)?;
        let pruned = index.validate();
        if pruned > 0 {
            tracing::debug!("Pruned {} dangling index entries", pruned);
        }
        self.index = index;

        let report = scan::scan(&self.root, &index_path, &self.registry, &mut self.index);
        self.persist_index();

        if self.config.eager_load {
            eager::load_eager(&mut self.env());
        }
        resolver::link_dependents(&self.index, &mut self.cache);

        if self.config.hot_reload {
            self.start_watcher();
        }

        self.initialized = true;
        tracing::info!(
            "Asset manager initialized for {}: {} assets indexed ({} new), {} loaded",
            self.root.display(),
            self.index.len(),
            report.new_ids,
            self.cache.len()
        );
        Ok(())
    }

    /// Stop watching, persist the index if it changed and drop every record.
    ///
    /// Outstanding [`AssetRef`]s stay valid but are no longer updated.
    pub fn shutdown(&mut self) {
        profile_function!();

        #[cfg(feature = "hot-reload")]
        {
            self.watcher = None;
        }
        if self.index.is_dirty() {
            self.persist_index();
        }
        self.cache.clear();
        self.events.clear();
        self.file_events.drain_all();
        self.initialized = false;
        tracing::debug!("Asset manager for {} shut down", self.root.display());
    }

    /// Whether [`initialize`](Self::initialize) has run since the last shutdown.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Get the payload for `key`, importing it and its requirements on first
    /// access.
    ///
    /// Returns `None` for unknown keys. A payload whose decode failed is
    /// returned in its default or previous state.
    pub fn get(&mut self, key: impl Into<AssetKey>) -> Option<AssetPayload> {
        profile_function!();

        let key = key.into();
        let Some(id) = self.index.id_of(&key) else {
            self.warn_unknown(&key);
            return None;
        };
        if !self.cache.contains(id) {
            self.load(id);
        }
        self.cache.find(id).map(|record| record.payload().clone())
    }

    /// Typed [`get`](Self::get). `None` on a miss or a kind mismatch.
    pub fn get_typed<T: Asset>(&mut self, key: impl Into<AssetKey>) -> Option<AssetRef<T>> {
        let key = key.into();
        let payload = self.get(key.clone())?;
        let asset = payload.downcast::<T>().cloned();
        if asset.is_none() {
            tracing::warn!(
                "'{}' is a {}, not a {}",
                key,
                payload.kind(),
                T::type_name()
            );
        }
        asset
    }

    /// Get the payload for `key` only if it is already cached.
    pub fn peek(&self, key: impl Into<AssetKey>) -> Option<AssetPayload> {
        let id = self.index.id_of(&key.into())?;
        self.cache.find(id).map(|record| record.payload().clone())
    }

    /// Typed [`peek`](Self::peek).
    pub fn peek_typed<T: Asset>(&self, key: impl Into<AssetKey>) -> Option<AssetRef<T>> {
        self.peek(key)?.downcast::<T>().cloned()
    }

    /// Whether `key` is a known asset, loaded or not.
    pub fn contains(&self, key: impl Into<AssetKey>) -> bool {
        self.index.id_of(&key.into()).is_some()
    }

    /// Whether `key` has a cached record.
    pub fn is_loaded(&self, key: impl Into<AssetKey>) -> bool {
        self.index
            .id_of(&key.into())
            .is_some_and(|id| self.cache.contains(id))
    }

    /// The persistent id of `key`.
    pub fn id_of(&self, key: impl Into<AssetKey>) -> Option<AssetId> {
        self.index.id_of(&key.into())
    }

    /// Load `key` during every future [`initialize`](Self::initialize).
    ///
    /// Returns `false` if the key is unknown or already eager.
    pub fn mark_eager(&mut self, key: impl Into<AssetKey>) -> bool {
        let key = key.into();
        match self.index.id_of(&key) {
            Some(id) => self.index.mark_no_lazy_load(id),
            None => {
                self.warn_unknown(&key);
                false
            }
        }
    }

    /// Re-import `key` from disk in place and propagate to its dependents.
    ///
    /// Imports it if it was not cached. Returns `false` for unknown keys.
    pub fn reload(&mut self, key: impl Into<AssetKey>) -> bool {
        profile_function!();

        let key = key.into();
        let Some(id) = self.index.id_of(&key) else {
            self.warn_unknown(&key);
            return false;
        };
        let mut env = self.env();
        if !env.update_id(id) {
            return false;
        }
        resolver::propagate_change(&mut env, id);
        true
    }

    /// Apply the file changes queued since the last call.
    ///
    /// Created or modified files read by a cached record, as its source or
    /// as a file the decode pulled in, re-import that record in place,
    /// followed by its dependents. New files with a registered
    /// importer get an id so they can be loaded lazily. Removals are ignored.
    /// Returns the number of records re-imported.
    pub fn process_file_events(&mut self) -> usize {
        profile_function!();

        let mut reimported = 0;
        for event in self.file_events.drain_all() {
            if event.kind == FileEventKind::Removed {
                tracing::debug!("Ignoring removal of {}", event.path.display());
                continue;
            }

            let ids = self.cached_ids_for_path(&event.path);
            if ids.is_empty() {
                if event.kind == FileEventKind::Created {
                    self.index_new_file(&event.path);
                }
                continue;
            }

            tracing::debug!("File changed, reloading: {}", event.path.display());
            let mut env = self.env();
            for id in ids {
                if env.update_id(id) {
                    reimported += 1;
                    reimported += resolver::propagate_change(&mut env, id).len();
                }
            }
        }

        if reimported > 0 {
            tracing::debug!("Hot reload: {} assets re-imported", reimported);
        }
        reimported
    }

    /// Sender for posting file events from other threads or tools.
    pub fn dispatcher(&self) -> DispatchSender<FileEvent> {
        self.file_events.sender()
    }

    /// Drain the events produced since the last call.
    pub fn drain_events(&mut self) -> impl Iterator<Item = AssetEvent> + '_ {
        self.events.drain()
    }

    /// Look at pending events without draining them.
    pub fn iter_events(&self) -> impl Iterator<Item = &AssetEvent> {
        self.events.iter()
    }

    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    /// The resolved project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index(&self) -> &AssetIndex {
        &self.index
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    pub fn importers(&self) -> &ImporterRegistry {
        &self.registry
    }

    fn env(&mut self) -> ImportEnv<'_> {
        ImportEnv {
            root: &self.root,
            registry: &self.registry,
            cache: &mut self.cache,
            index: &mut self.index,
            events: &mut self.events,
        }
    }

    /// Import `id` after everything it is known to require.
    fn load(&mut self, id: AssetId) {
        let order = match resolver::resolve(&self.index, &[id]) {
            Ok(order) => order,
            Err(e) => {
                tracing::error!("Cannot order requirements of {}: {}", id, e);
                vec![id]
            }
        };
        let mut env = self.env();
        for required in order {
            env.import_id(required);
        }
    }

    /// Cached records that read `path`, as their main source or as an extra
    /// one. Paths under the root are matched without filesystem access.
    fn cached_ids_for_path(&self, path: &Path) -> Vec<AssetId> {
        let mut ids = Vec::new();
        if path.starts_with(&self.root) {
            let key = canonicalize(&self.root, path);
            ids.extend(self.index.id_of(&key).filter(|&id| self.cache.contains(id)));
            for id in self.cache.readers_of(path) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        } else {
            ids.extend(
                self.cache
                    .iter()
                    .filter(|(_, record)| {
                        record.source().matches(path)
                            || record.extra_sources().iter().any(|source| source.matches(path))
                    })
                    .map(|(id, _)| id),
            );
        }
        ids
    }

    fn index_new_file(&mut self, path: &Path) {
        let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let path = path.as_path();
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return;
        };
        let has_importer = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.registry.has_importer(ext));
        if !has_importer || !path.is_file() {
            return;
        }
        let key = canonicalize(&self.root, path);
        if self.index.id_of(&key).is_none() {
            let id = self.index.id_for(&key, relative);
            tracing::debug!("New file '{}' indexed as {}", key, id);
        }
    }

    fn persist_index(&mut self) {
        let index_path = self.root.join(&self.config.index_file);
        if let Err(e) = self.index.save(&index_path) {
            tracing::error!("Failed to persist asset index: {}", e);
        }
    }

    fn warn_unknown(&self, key: &AssetKey) {
        match key.extension() {
            Some(extension) if !self.registry.has_importer(extension) => {
                tracing::warn!(
                    "No asset '{}': {}",
                    key,
                    AssetError::MissingImporter {
                        extension: extension.to_string()
                    }
                );
            }
            _ => tracing::warn!("No asset with key '{}'", key),
        }
    }

    #[cfg(feature = "hot-reload")]
    fn start_watcher(&mut self) {
        use crate::hot_reload::AssetWatcher;

        let started = AssetWatcher::new(self.file_events.sender()).and_then(|mut watcher| {
            watcher.watch_directory(&self.root)?;
            Ok(watcher)
        });
        match started {
            Ok(watcher) => {
                self.watcher = Some(watcher);
                tracing::info!("Hot reload enabled for directory: {}", self.root.display());
            }
            Err(e) => tracing::warn!("Continuing without hot reload: {}", e),
        }
    }

    #[cfg(not(feature = "hot-reload"))]
    fn start_watcher(&mut self) {
        tracing::warn!("Hot reload requested but the `hot-reload` feature is disabled");
    }
}
