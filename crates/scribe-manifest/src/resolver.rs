//! Symbolic class name → source path

use crate::manifest::Manifest;
use std::path::PathBuf;

/// Resolves class names against a borrowed [`Manifest`]
///
/// Staleness is not checked here: a returned path may no longer exist.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'m> {
    manifest: &'m Manifest,
}

impl<'m> Resolver<'m> {
    /// Create resolver over manifest
    #[inline]
    #[must_use]
    pub fn new(manifest: &'m Manifest) -> Self {
        Self { manifest }
    }

    /// Path registered for `name` (leading `\` ignored)
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let path = self.manifest.get(name).map(std::path::Path::to_path_buf);
        if path.is_none() {
            tracing::debug!(name, "class not in manifest");
        }
        path
    }

    /// Underlying manifest
    #[inline]
    #[must_use]
    pub fn manifest(&self) -> &'m Manifest {
        self.manifest
    }
}
