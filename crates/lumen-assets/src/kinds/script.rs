use std::path::{Path, PathBuf};

use crate::error::AssetResult;
use crate::importer::{AssetImporter, ImportContext};

/// Script source handed to the embedded interpreter.
#[derive(Debug, Clone, Default)]
pub struct Script {
    path: PathBuf,
    source: String,
}

impl Script {
    pub fn new(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Path the script was loaded from, used for interpreter diagnostics.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Keeps `.lua` and `.script` files as text.
pub struct ScriptImporter;

impl AssetImporter for ScriptImporter {
    type Asset = Script;

    fn extensions(&self) -> &[&str] {
        &["lua", "script"]
    }

    fn read_asset_data(&self, asset: &mut Script, ctx: &mut ImportContext<'_>) -> AssetResult<()> {
        *asset = Script::new(ctx.path(), ctx.text()?);
        Ok(())
    }
}
