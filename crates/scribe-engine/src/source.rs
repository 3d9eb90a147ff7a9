//! Source references and loaded units

use crate::error::{EngineError, EngineResult};
use scribe_manifest::Resolver;
use scribe_model::{parse_source, SourceUnit};
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

/// Where a source unit comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceRef {
    /// Filesystem path
    Path(PathBuf),
    /// Class name looked up in the manifest
    Symbol(String),
}

impl SourceRef {
    /// Create symbolic reference
    #[inline]
    #[must_use]
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Symbol(name.into())
    }

    /// Path the reference points to right now
    ///
    /// Symbols go through the manifest each time; paths are returned as is.
    #[must_use]
    pub fn locate(&self, resolver: &Resolver<'_>) -> Option<PathBuf> {
        match self {
            Self::Path(path) => Some(path.clone()),
            Self::Symbol(name) => resolver.resolve(name),
        }
    }
}

impl From<&str> for SourceRef {
    /// Class names never contain `.` or `/`
    fn from(text: &str) -> Self {
        if text.contains('.') || text.contains('/') {
            Self::Path(PathBuf::from(text))
        } else {
            Self::Symbol(text.trim().to_string())
        }
    }
}

impl From<String> for SourceRef {
    fn from(text: String) -> Self {
        Self::from(text.as_str())
    }
}

impl From<PathBuf> for SourceRef {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for SourceRef {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl Display for SourceRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Symbol(name) => f.write_str(name),
        }
    }
}

/// A parsed unit with its origin and content checksum
#[derive(Debug, Clone)]
pub struct LoadedUnit {
    /// Origin
    pub source: SourceRef,
    /// Path read at load time (`None` for in-memory units)
    pub path: Option<PathBuf>,
    /// Structural model
    pub unit: SourceUnit,
    /// blake3 of the text last read or written
    pub checksum: blake3::Hash,
}

impl LoadedUnit {
    /// Load a unit from the filesystem or through the manifest
    ///
    /// # Errors
    /// - [`EngineError::UnresolvedSource`] for an unknown symbol
    /// - [`EngineError::Io`] when the file cannot be read
    /// - [`EngineError::Model`] when the text cannot be modelled
    pub fn load(source: SourceRef, resolver: &Resolver<'_>) -> EngineResult<Self> {
        let path = source
            .locate(resolver)
            .ok_or_else(|| EngineError::UnresolvedSource {
                name: source.to_string(),
            })?;
        let text =
            std::fs::read_to_string(&path).map_err(|e| EngineError::io_error(&path, e))?;
        let unit = parse_source(&text).map_err(|source| EngineError::Model {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(%source, types = unit.type_count(), "loaded source unit");
        Ok(Self {
            source,
            checksum: blake3::hash(text.as_bytes()),
            path: Some(path),
            unit,
        })
    }

    /// Parse a unit from text that has no file behind it yet
    ///
    /// # Errors
    /// Returns [`EngineError::Model`] when the text cannot be modelled.
    pub fn from_text(source: SourceRef, text: &str) -> EngineResult<Self> {
        let unit = parse_source(text).map_err(|e| EngineError::Model {
            path: PathBuf::from(source.to_string()),
            source: e,
        })?;
        Ok(Self {
            source,
            path: None,
            unit,
            checksum: blake3::hash(text.as_bytes()),
        })
    }
}
