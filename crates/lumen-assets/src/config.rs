//! Asset pipeline configuration.

use std::path::{Path, PathBuf};

use crate::index::DEFAULT_INDEX_FILE;

/// Settings for an [`AssetManager`](crate::AssetManager).
///
/// # Example
///
/// ```ignore
/// let config = AssetConfig::new("assets")
///     .with_index_file("index.json")
///     .with_hot_reload(false);
/// ```
#[derive(Debug, Clone)]
pub struct AssetConfig {
    /// Project root scanned for assets.
    pub root: PathBuf,
    /// Name of the identity index, relative to `root`.
    pub index_file: String,
    /// Watch `root` and reload changed files.
    pub hot_reload: bool,
    /// Import `no_lazy_load` assets during `initialize`.
    pub eager_load: bool,
}

impl AssetConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_index_file(mut self, name: impl Into<String>) -> Self {
        self.index_file = name.into();
        self
    }

    pub fn with_hot_reload(mut self, enabled: bool) -> Self {
        self.hot_reload = enabled;
        self
    }

    pub fn with_eager_load(mut self, enabled: bool) -> Self {
        self.eager_load = enabled;
        self
    }

    /// Absolute location of the index document.
    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index_file)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            index_file: DEFAULT_INDEX_FILE.to_string(),
            hot_reload: cfg!(feature = "hot-reload"),
            eager_load: true,
        }
    }
}
