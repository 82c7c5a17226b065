//! Asset identity: path-derived keys and persistent numeric ids.

use std::fmt;
use std::num::ParseIntError;
use std::path::{Component, Path};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Delimiter that replaces directory separators in an [`AssetKey`].
pub const KEY_DELIMITER: char = '.';

/// Stable 64-bit identity of an asset.
///
/// Allocated once per new key and persisted in the index forever after.
/// Serialized as a plain number, and as a decimal string where JSON needs
/// string map keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(u64);

impl AssetId {
    /// Wrap a raw id value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Allocate a fresh random id. Never returns zero.
    pub fn random() -> Self {
        loop {
            let raw = rand::random::<u64>();
            if raw != 0 {
                return Self(raw);
            }
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AssetId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Canonical, path-derived identity of an asset.
///
/// `standard/standard.mat` under the project root becomes
/// `standard.standard.mat`. Keys stay stable as long as the file's
/// root-relative path does.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKey(String);

impl AssetKey {
    /// Build a key from a string, normalizing `/` and `\` to the delimiter.
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(join_segments(std::iter::once(key.as_ref())))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The trailing segment after the last delimiter, used for importer
    /// dispatch. `None` for keys without a delimiter.
    pub fn extension(&self) -> Option<&str> {
        self.0
            .rsplit_once(KEY_DELIMITER)
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetKey {
    fn from(key: &str) -> Self {
        AssetKey::new(key)
    }
}

impl From<String> for AssetKey {
    fn from(key: String) -> Self {
        AssetKey::new(key)
    }
}

impl AsRef<str> for AssetKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the key of `path` relative to the project `root`.
///
/// Pure string manipulation, no filesystem access. Paths outside `root` keep
/// their normal components. Re-canonicalizing a key returns it unchanged.
pub fn canonicalize(root: &Path, path: &Path) -> AssetKey {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    AssetKey(join_segments(parts.iter().map(String::as_str)))
}

fn join_segments<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let mut key = String::new();
    for segment in parts.flat_map(|part| part.split(['/', '\\'])) {
        if segment.is_empty() {
            continue;
        }
        if !key.is_empty() {
            key.push(KEY_DELIMITER);
        }
        key.push_str(segment);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_nested_path() {
        let root = Path::new("/project");
        let key = canonicalize(root, Path::new("/project/standard/standard.mat"));
        assert_eq!(key.as_str(), "standard.standard.mat");
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let root = Path::new("/project");
        let key = canonicalize(root, Path::new("/project/a/b/c.shader"));
        let again = canonicalize(root, Path::new(key.as_str()));
        assert_eq!(key, again);
        assert_eq!(AssetKey::new(key.as_str()), key);
    }

    #[test]
    fn test_canonicalize_outside_root() {
        let key = canonicalize(Path::new("/project"), Path::new("other/tex.png"));
        assert_eq!(key.as_str(), "other.tex.png");
    }

    #[test]
    fn test_key_normalizes_separators() {
        assert_eq!(AssetKey::new("standard/standard.mat").as_str(), "standard.standard.mat");
        assert_eq!(AssetKey::new("fonts\\ui.ttf").as_str(), "fonts.ui.ttf");
        assert_eq!(AssetKey::new("/lead//slash.mat").as_str(), "lead.slash.mat");
    }

    #[test]
    fn test_key_extension() {
        assert_eq!(AssetKey::new("standard.standard.mat").extension(), Some("mat"));
        assert_eq!(AssetKey::new("Makefile").extension(), None);
    }

    #[test]
    fn test_random_id_nonzero() {
        for _ in 0..64 {
            assert_ne!(AssetId::random().get(), 0);
        }
    }

    #[test]
    fn test_id_parse_and_display() {
        let id: AssetId = "7".parse().unwrap();
        assert_eq!(id, AssetId::from_raw(7));
        assert_eq!(id.to_string(), "7");
    }
}
