//! Error types for manifest construction

use std::path::PathBuf;

/// Errors while building a [`crate::Manifest`]
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// IO error reading a manifest source
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed `composer.json`
    #[error("invalid composer.json at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Project root has neither a classmap nor a `composer.json`
    #[error("no composer.json or classmap under {0}")]
    MissingComposerJson(PathBuf),
}

impl ManifestError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for manifest operations
pub type ManifestResult<T> = Result<T, ManifestError>;
