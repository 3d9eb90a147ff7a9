//! Class manifest with radix tree index
//!
//! Provides [`Manifest`], a read-only FQN → file path map. Keys are stored
//! without the leading namespace separator so prefix lookups line up with
//! namespace boundaries.

use radix_trie::{Trie, TrieCommon};
use std::path::{Path, PathBuf};

/// Fully-qualified class name → source path
///
/// Built once per run and passed explicitly by reference; never global.
#[derive(Debug)]
pub struct Manifest {
    trie: Trie<String, PathBuf>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

impl Manifest {
    /// Create empty manifest
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { trie: Trie::new() }
    }

    /// Build manifest from (name, path) pairs
    pub fn from_entries<I, N, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, P)>,
        N: AsRef<str>,
        P: Into<PathBuf>,
    {
        let mut manifest = Self::new();
        for (name, path) in entries {
            manifest.insert(name.as_ref(), path);
        }
        manifest
    }

    /// Insert entry, returning the path it replaced
    pub fn insert(&mut self, name: &str, path: impl Into<PathBuf>) -> Option<PathBuf> {
        self.trie.insert(key(name), path.into())
    }

    /// Lookup path for a class name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.trie.get(&key(name)).map(PathBuf::as_path)
    }

    /// Check if class name has an entry
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.trie.len()
    }

    /// Check if manifest is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.trie.iter().map(|(name, path)| (name.as_str(), path.as_path()))
    }

    /// Entries inside a namespace (recursively), sorted by name
    ///
    /// An empty prefix lists everything.
    #[must_use]
    pub fn in_namespace(&self, prefix: &str) -> Vec<(String, PathBuf)> {
        let prefix = key(prefix);
        let mut entries: Vec<(String, PathBuf)> = if prefix.is_empty() {
            self.iter()
                .map(|(name, path)| (name.to_string(), path.to_path_buf()))
                .collect()
        } else {
            let scoped = format!("{prefix}\\");
            self.trie
                .get_raw_descendant(&scoped)
                .map(|subtrie| {
                    subtrie
                        .iter()
                        .filter(|(name, _)| name.starts_with(&scoped))
                        .map(|(name, path)| (name.clone(), path.clone()))
                        .collect()
                })
                .unwrap_or_default()
        };
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

/// Trie key for a class name
fn key(name: &str) -> String {
    name.trim().trim_start_matches('\\').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Manifest {
        Manifest::from_entries([
            ("App\\Models\\User", "app/Models/User.php"),
            ("App\\Models\\Post", "app/Models/Post.php"),
            ("App\\ModelsExtra\\Tag", "app/ModelsExtra/Tag.php"),
            ("Vendor\\Thing", "vendor/thing/Thing.php"),
        ])
    }

    #[test]
    fn manifest_get_ignores_leading_separator() {
        let manifest = sample();

        assert_eq!(
            manifest.get("\\App\\Models\\User"),
            Some(Path::new("app/Models/User.php"))
        );
        assert!(manifest.contains("Vendor\\Thing"));
        assert!(!manifest.contains("App\\Models"));
        assert_eq!(manifest.len(), 4);
    }

    #[test]
    fn manifest_insert_replaces() {
        let mut manifest = sample();
        let old = manifest.insert("Vendor\\Thing", "other.php");

        assert_eq!(old, Some(PathBuf::from("vendor/thing/Thing.php")));
        assert_eq!(manifest.get("Vendor\\Thing"), Some(Path::new("other.php")));
    }

    #[test]
    fn manifest_in_namespace_respects_boundaries() {
        let manifest = sample();
        let models: Vec<String> = manifest
            .in_namespace("App\\Models")
            .into_iter()
            .map(|(name, _)| name)
            .collect();

        assert_eq!(models, vec!["App\\Models\\Post", "App\\Models\\User"]);
        assert_eq!(manifest.in_namespace("").len(), 4);
        assert!(manifest.in_namespace("Missing").is_empty());
    }

    #[test]
    fn manifest_empty() {
        let manifest = Manifest::new();
        assert!(manifest.is_empty());
        assert!(manifest.get("Anything").is_none());
    }
}
