//! Importer traits, the generic import/update lifecycle and the extension
//! registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lumen_core::alloc::HashMap;
use lumen_core::profiling::profile_function;

use crate::cache::{AssetCache, AssetRecord};
use crate::error::{AssetError, AssetResult};
use crate::event::{AssetEvent, AssetEventBuffer};
use crate::handle::AssetRef;
use crate::index::AssetIndex;
use crate::key::{AssetId, AssetKey, canonicalize};
use crate::payload::{Asset, AssetKind};
use crate::source::SourceFile;
use crate::state::LoadState;

/// Kind-specific decode logic.
///
/// Implement this to teach the pipeline a file format. The shared lifecycle
/// in [`ErasedImporter`] takes care of identity, caching, in-place reloads
/// and error reporting.
///
/// # Example
///
/// ```ignore
/// struct LuaImporter;
///
/// impl AssetImporter for LuaImporter {
///     type Asset = Script;
///
///     fn extensions(&self) -> &[&str] {
///         &["lua"]
///     }
///
///     fn read_asset_data(&self, asset: &mut Script, ctx: &mut ImportContext<'_>) -> AssetResult<()> {
///         *asset = Script::new(ctx.path(), ctx.text()?);
///         Ok(())
///     }
/// }
/// ```
pub trait AssetImporter: Send + Sync + 'static {
    /// The payload type this importer fills.
    type Asset: Asset;

    /// The file extensions this importer handles (without dots).
    fn extensions(&self) -> &[&str];

    /// Construct the empty payload registered before the first decode.
    fn initialize_asset(&self) -> Self::Asset {
        Self::Asset::default()
    }

    /// Decode the source bytes into `asset`.
    fn read_asset_data(&self, asset: &mut Self::Asset, ctx: &mut ImportContext<'_>)
    -> AssetResult<()>;
}

/// Type-erased importer stored in the [`ImporterRegistry`].
///
/// Implemented for every [`AssetImporter`]; the implementation is the shared
/// import/update lifecycle.
pub trait ErasedImporter: Send + Sync {
    /// Name of the payload type this importer produces.
    fn type_name(&self) -> &'static str;

    /// Import `path` unless its id is already cached.
    fn import(&self, path: &Path, env: &mut ImportEnv<'_>) -> Option<AssetId>;

    /// Re-decode `path` into its existing payload, or import it if uncached.
    fn update(&self, path: &Path, env: &mut ImportEnv<'_>) -> Option<AssetId>;
}

impl<I: AssetImporter> ErasedImporter for I {
    fn type_name(&self) -> &'static str {
        I::Asset::type_name()
    }

    fn import(&self, path: &Path, env: &mut ImportEnv<'_>) -> Option<AssetId> {
        profile_function!();
        let (key, id) = env.identify(path);

        if env.cache.contains(id) {
            tracing::warn!("Skipping '{}': {}", key, AssetError::DuplicateImport { id });
            return Some(id);
        }

        let asset = AssetRef::new(self.initialize_asset());
        env.cache.register(
            id,
            AssetRecord::new(key.clone(), SourceFile::new(path), I::Asset::into_payload(asset.clone())),
        );
        tracing::debug!("Importing {} '{}' ({})", I::Asset::type_name(), key, id);
        decode(self, &asset, id, &key, path, env, false);
        Some(id)
    }

    fn update(&self, path: &Path, env: &mut ImportEnv<'_>) -> Option<AssetId> {
        profile_function!();
        let (key, id) = env.identify(path);

        let Some(record) = env.cache.find(id) else {
            return self.import(path, env);
        };
        let Some(asset) = I::Asset::from_payload(record.payload()).cloned() else {
            tracing::warn!(
                "Cannot reload '{}': cached as {}, importer produces {}",
                key,
                record.kind(),
                I::Asset::type_name()
            );
            return None;
        };

        tracing::debug!("Reloading {} '{}' ({})", I::Asset::type_name(), key, id);
        decode(self, &asset, id, &key, path, env, true);
        Some(id)
    }
}

/// Decode into a scratch payload and swap it into `asset` on success.
///
/// On failure the payload keeps what it had: the default on first import,
/// the previous content on reload.
fn decode<I: AssetImporter>(
    importer: &I,
    asset: &AssetRef<I::Asset>,
    id: AssetId,
    key: &AssetKey,
    path: &Path,
    env: &mut ImportEnv<'_>,
    reloading: bool,
) -> bool {
    // The decode re-records the edges it still uses.
    let previous = detach_requirements(env, id);

    let mut extra_sources = Vec::new();
    let result = SourceFile::new(path).read().and_then(|bytes| {
        let mut fresh = importer.initialize_asset();
        let mut ctx = ImportContext::new(env.reborrow(), id, key, path, &bytes);
        let decoded = importer.read_asset_data(&mut fresh, &mut ctx);
        extra_sources = ctx.into_extra_sources();
        decoded.map(|()| fresh)
    });

    let kind = I::Asset::KIND;
    match result {
        Ok(fresh) => {
            let version = asset.replace(fresh);
            if let Some(record) = env.cache.find_mut(id) {
                record.set_state(LoadState::Loaded);
                record.set_extra_sources(extra_sources);
            }
            env.events.push(if reloading {
                AssetEvent::Reloaded { id, kind, version }
            } else {
                AssetEvent::Imported { id, kind, version }
            });
            true
        }
        Err(err) => {
            tracing::warn!("{} '{}' failed to decode: {}", kind, key, err);
            // Previous content stays, and so do its edges and sources.
            detach_requirements(env, id);
            reattach_requirements(env, id, &previous);
            if let Some(record) = env.cache.find_mut(id) {
                record.set_state(LoadState::Failed(err.to_string()));
                for source in extra_sources {
                    record.add_extra_source(source);
                }
            }
            env.events.push(AssetEvent::ImportFailed {
                id,
                kind,
                error: err.to_string(),
            });
            false
        }
    }
}

/// Remove the requires-edges of `id` from the index and the dependent lists.
fn detach_requirements(env: &mut ImportEnv<'_>, id: AssetId) -> Vec<AssetId> {
    let previous = env.index.clear_requirements(id);
    for &required in &previous {
        if let Some(record) = env.cache.find_mut(required) {
            record.remove_dependent(id);
        }
    }
    previous
}

fn reattach_requirements(env: &mut ImportEnv<'_>, id: AssetId, previous: &[AssetId]) {
    for &required in previous {
        env.index.add_requirement(id, required);
        if let Some(record) = env.cache.find_mut(required) {
            record.add_dependent(id);
        }
    }
}

/// Fallback for extensions without a registered importer.
///
/// Logs a warning and does nothing, so one unknown file never aborts a scan.
pub struct NoopImporter;

impl ErasedImporter for NoopImporter {
    fn type_name(&self) -> &'static str {
        "<none>"
    }

    fn import(&self, path: &Path, _env: &mut ImportEnv<'_>) -> Option<AssetId> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::warn!("Ignoring '{}': {}", path.display(), AssetError::MissingImporter { extension });
        None
    }

    fn update(&self, path: &Path, env: &mut ImportEnv<'_>) -> Option<AssetId> {
        self.import(path, env)
    }
}

static NOOP_IMPORTER: NoopImporter = NoopImporter;

/// Registry of importers, keyed by lowercase file extension.
///
/// Registering an extension twice replaces the earlier importer.
#[derive(Default)]
pub struct ImporterRegistry {
    by_extension: HashMap<String, Arc<dyn ErasedImporter>>,
}

impl ImporterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an importer for its declared extensions.
    pub fn register<I: AssetImporter>(&mut self, importer: I) {
        let extensions: Vec<String> = importer.extensions().iter().map(|e| e.to_string()).collect();
        self.register_erased(&extensions, Arc::new(importer));
    }

    /// Register an importer for an explicit list of extensions.
    pub fn register_for<I: AssetImporter>(&mut self, extensions: &[&str], importer: I) {
        let extensions: Vec<String> = extensions.iter().map(|e| e.to_string()).collect();
        self.register_erased(&extensions, Arc::new(importer));
    }

    fn register_erased(&mut self, extensions: &[String], importer: Arc<dyn ErasedImporter>) {
        for ext in extensions {
            let ext = ext.trim_start_matches('.').to_lowercase();
            if let Some(previous) = self.by_extension.insert(ext.clone(), importer.clone()) {
                tracing::debug!(
                    "Importer for .{} replaced ({} -> {})",
                    ext,
                    previous.type_name(),
                    importer.type_name()
                );
            }
        }
    }

    /// Get the importer registered for `extension`.
    pub fn get(&self, extension: &str) -> Option<&dyn ErasedImporter> {
        self.by_extension
            .get(&extension.to_lowercase())
            .map(|importer| &**importer)
    }

    /// Get the importer for `extension`, or the [`NoopImporter`].
    pub fn importer_for(&self, extension: Option<&str>) -> &dyn ErasedImporter {
        extension
            .and_then(|ext| self.get(ext))
            .unwrap_or(&NOOP_IMPORTER)
    }

    /// Get the importer for a path's extension, or the [`NoopImporter`].
    pub fn importer_for_path(&self, path: &Path) -> &dyn ErasedImporter {
        self.importer_for(path.extension().and_then(|e| e.to_str()))
    }

    /// Check if any importer handles `extension`.
    pub fn has_importer(&self, extension: &str) -> bool {
        self.by_extension.contains_key(&extension.to_lowercase())
    }

    /// All registered extensions.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.by_extension.keys().map(String::as_str)
    }
}

/// Mutable view of the pipeline state handed through the import lifecycle.
///
/// Only the owner of the [`AssetManager`](crate::AssetManager) can build one,
/// which keeps every cache and index mutation on the owning thread.
pub struct ImportEnv<'a> {
    pub(crate) root: &'a Path,
    pub(crate) registry: &'a ImporterRegistry,
    pub(crate) cache: &'a mut AssetCache,
    pub(crate) index: &'a mut AssetIndex,
    pub(crate) events: &'a mut AssetEventBuffer,
}

impl<'a> ImportEnv<'a> {
    pub(crate) fn reborrow(&mut self) -> ImportEnv<'_> {
        ImportEnv {
            root: self.root,
            registry: self.registry,
            cache: &mut *self.cache,
            index: &mut *self.index,
            events: &mut *self.events,
        }
    }

    /// Key and id of an absolute path, assigning an id if the key is new.
    pub(crate) fn identify(&mut self, path: &Path) -> (AssetKey, AssetId) {
        let key = canonicalize(self.root, path);
        let relative = path.strip_prefix(self.root).unwrap_or(path);
        let id = self.index.id_for(&key, relative);
        (key, id)
    }

    /// Absolute source path of `id`.
    pub(crate) fn source_path(&self, id: AssetId) -> Option<PathBuf> {
        self.index.path_for(id).map(|relative| self.root.join(relative))
    }

    /// Import `id` from its indexed path. Returns `true` if it is cached
    /// afterwards.
    pub(crate) fn import_id(&mut self, id: AssetId) -> bool {
        if self.cache.contains(id) {
            return true;
        }
        let Some(path) = self.source_path(id) else {
            tracing::warn!("Cannot import asset {}: no path in the index", id);
            return false;
        };
        let registry = self.registry;
        registry.importer_for_path(&path).import(&path, self);
        self.cache.contains(id)
    }

    /// Re-import `id` in place from its indexed path.
    pub(crate) fn update_id(&mut self, id: AssetId) -> bool {
        let Some(path) = self.source_path(id) else {
            tracing::warn!("Cannot reload asset {}: no path in the index", id);
            return false;
        };
        let registry = self.registry;
        registry.importer_for_path(&path).update(&path, self).is_some()
    }
}

/// Everything a decoder sees while filling one payload.
pub struct ImportContext<'a> {
    env: ImportEnv<'a>,
    id: AssetId,
    key: &'a AssetKey,
    path: &'a Path,
    bytes: &'a [u8],
    extra_sources: Vec<SourceFile>,
}

impl<'a> ImportContext<'a> {
    pub(crate) fn new(
        env: ImportEnv<'a>,
        id: AssetId,
        key: &'a AssetKey,
        path: &'a Path,
        bytes: &'a [u8],
    ) -> Self {
        Self {
            env,
            id,
            key,
            path,
            bytes,
            extra_sources: Vec::new(),
        }
    }

    pub(crate) fn into_extra_sources(self) -> Vec<SourceFile> {
        self.extra_sources
    }

    /// The id of the asset being decoded.
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// The key of the asset being decoded.
    pub fn key(&self) -> &AssetKey {
        self.key
    }

    /// Absolute path of the source file.
    pub fn path(&self) -> &Path {
        self.path
    }

    /// Raw source bytes.
    pub fn bytes(&self) -> &[u8] {
        self.bytes
    }

    /// Source bytes as UTF-8 text.
    pub fn text(&self) -> AssetResult<&str> {
        std::str::from_utf8(self.bytes)
            .map_err(|e| AssetError::malformed(self.path, format!("Invalid UTF-8: {}", e)))
    }

    /// Build a [`AssetError::MalformedSource`] for the current file.
    pub fn malformed(&self, message: impl Into<String>) -> AssetError {
        AssetError::malformed(self.path, message)
    }

    /// Read a file next to the current source, e.g. a shader stage.
    ///
    /// The file becomes an extra source of the asset: a change to it
    /// re-imports the asset like a change to its main source. It is tracked
    /// even when the read fails, so creating a missing file fixes the asset.
    pub fn read_sibling(&mut self, relative: impl AsRef<Path>) -> AssetResult<Vec<u8>> {
        let dir = self.path.parent().unwrap_or(self.env.root);
        let path = dir.join(relative);
        let path = std::fs::canonicalize(&path).unwrap_or(path);
        let source = SourceFile::new(path);
        let bytes = source.read();
        if !self.extra_sources.contains(&source) {
            self.extra_sources.push(source);
        }
        bytes
    }

    /// Resolve another asset this one requires.
    ///
    /// Records the `requires` edge in the index, imports the dependency first
    /// if it is not cached yet, and registers the current asset to be
    /// re-imported whenever the dependency changes. Returns `None` (after
    /// logging) if the key is unknown, cannot be imported, or is of another
    /// kind.
    pub fn dependency<T: Asset>(&mut self, key: impl Into<AssetKey>) -> Option<AssetRef<T>> {
        let key = key.into();
        let missing = || AssetError::MissingDependency {
            dependent: self.key.clone(),
            key: key.clone(),
        };

        let Some(required) = self.env.index.id_of(&key) else {
            tracing::warn!("{}", missing());
            return None;
        };
        if required == self.id {
            tracing::warn!("'{}' lists itself as a dependency, ignoring", self.key);
            return None;
        }

        self.env.index.add_requirement(self.id, required);
        if !self.env.import_id(required) {
            tracing::warn!("{}", missing());
            return None;
        }

        let record = self.env.cache.find_mut(required)?;
        record.add_dependent(self.id);
        let found: AssetKind = record.kind();
        match T::from_payload(record.payload()) {
            Some(asset) => Some(asset.clone()),
            None => {
                tracing::warn!(
                    "'{}' expects '{}' to be a {}, found {}",
                    self.key,
                    key,
                    T::type_name(),
                    found
                );
                None
            }
        }
    }
}
