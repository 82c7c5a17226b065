//! Startup discovery of asset files under the project root.

use std::path::{Path, PathBuf};

use lumen_core::profiling::profile_function;
use walkdir::WalkDir;

use crate::error::AssetError;
use crate::importer::ImporterRegistry;
use crate::index::AssetIndex;
use crate::key::{AssetId, canonicalize};

/// Summary of one scan pass.
#[derive(Debug, Default, Clone)]
pub struct ScanReport {
    /// Every importable file, with its id.
    pub discovered: Vec<(AssetId, PathBuf)>,
    /// Number of keys that were given a fresh id.
    pub new_ids: usize,
    /// Files skipped because no importer handles their extension.
    pub skipped: Vec<PathBuf>,
}

/// Walk `root` and give every file the registry can import an id in `index`.
///
/// The import itself is deferred: the eager pass or the first
/// [`AssetManager::get`](crate::AssetManager::get) decodes it. Symlinks are
/// not followed and `index_file` itself is skipped. Unreadable directory
/// entries are logged and skipped.
pub fn scan(
    root: &Path,
    index_file: &Path,
    registry: &ImporterRegistry,
    index: &mut AssetIndex,
) -> ScanReport {
    profile_function!();

    let mut report = ScanReport::default();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry during scan: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() || entry.path() == index_file {
            continue;
        }

        let path = entry.path();
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !registry.has_importer(extension) {
            tracing::warn!(
                "Skipping '{}': {}",
                path.display(),
                AssetError::MissingImporter {
                    extension: extension.to_string()
                }
            );
            report.skipped.push(path.to_path_buf());
            continue;
        }

        let key = canonicalize(root, path);
        let relative = path.strip_prefix(root).unwrap_or(path);
        let known = index.id_of(&key).is_some();
        let id = index.id_for(&key, relative);
        if !known {
            tracing::debug!("Discovered '{}' as {}", key, id);
            report.new_ids += 1;
        }
        report.discovered.push((id, path.to_path_buf()));
    }

    tracing::debug!(
        "Scanned {}: {} assets ({} new), {} skipped",
        root.display(),
        report.discovered.len(),
        report.new_ids,
        report.skipped.len()
    );
    report
}
