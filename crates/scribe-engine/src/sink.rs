//! Emission of validated text: return it, write it back, or both

use crate::error::{EngineError, EngineResult};
use crate::source::{LoadedUnit, SourceRef};
use scribe_manifest::Resolver;
use std::path::PathBuf;
use std::str::FromStr;

/// What emit does with validated text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EmitMode {
    /// Return text only
    #[default]
    ReturnOnly,
    /// Write back only
    WriteOnly,
    /// Write back and return
    Both,
}

impl EmitMode {
    /// Mode writes to the filesystem
    #[inline]
    #[must_use]
    pub fn writes(self) -> bool {
        matches!(self, Self::WriteOnly | Self::Both)
    }

    /// Mode returns text
    #[inline]
    #[must_use]
    pub fn returns(self) -> bool {
        matches!(self, Self::ReturnOnly | Self::Both)
    }
}

impl FromStr for EmitMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "return" | "return_only" => Ok(Self::ReturnOnly),
            "write" | "write_only" => Ok(Self::WriteOnly),
            "both" => Ok(Self::Both),
            other => Err(EngineError::Config(format!("unknown emit mode '{other}'"))),
        }
    }
}

/// Outcome for one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Text returned, nothing written
    Returned,
    /// Written to its origin
    Written,
    /// Origin already held the same text
    Unchanged,
    /// Origin no longer exists
    SkippedStale,
}

/// Result of emitting one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedUnit {
    /// Origin
    pub source: SourceRef,
    /// Write target, if resolved
    pub path: Option<PathBuf>,
    /// Validated text (present when the mode returns)
    pub contents: Option<String>,
    /// What happened
    pub disposition: Disposition,
}

/// Results of one emit call, in load order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Emission(Vec<EmittedUnit>);

impl Emission {
    /// Contents of the first unit
    #[inline]
    #[must_use]
    pub fn first_contents(&self) -> Option<&str> {
        self.0.first().and_then(|unit| unit.contents.as_deref())
    }

    /// Iterate results
    pub fn iter(&self) -> impl Iterator<Item = &EmittedUnit> {
        self.0.iter()
    }

    /// Number of results
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No units were emitted
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Units written to disk
    #[must_use]
    pub fn written(&self) -> usize {
        self.iter()
            .filter(|unit| unit.disposition == Disposition::Written)
            .count()
    }
}

impl FromIterator<EmittedUnit> for Emission {
    fn from_iter<I: IntoIterator<Item = EmittedUnit>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Emission {
    type Item = EmittedUnit;
    type IntoIter = std::vec::IntoIter<EmittedUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Delivers validated text to callers and back to origins
#[derive(Debug, Clone, Copy)]
pub struct Sink<'m> {
    resolver: Resolver<'m>,
}

impl<'m> Sink<'m> {
    /// Create sink resolving write targets through `resolver`
    #[inline]
    #[must_use]
    pub fn new(resolver: Resolver<'m>) -> Self {
        Self { resolver }
    }

    /// Write target for an origin, if it still exists
    ///
    /// Symbols are looked up again so a class moved since load is written to
    /// its current location.
    #[must_use]
    pub fn target(&self, source: &SourceRef) -> Option<PathBuf> {
        source.locate(&self.resolver).filter(|path| path.is_file())
    }

    /// Deliver validated `text` for `unit`
    ///
    /// # Errors
    /// Returns [`EngineError::Io`] when writing the target fails.
    pub fn deliver(
        &self,
        unit: &mut LoadedUnit,
        text: String,
        mode: EmitMode,
    ) -> EngineResult<EmittedUnit> {
        let mut emitted = EmittedUnit {
            source: unit.source.clone(),
            path: None,
            contents: None,
            disposition: Disposition::Returned,
        };

        if mode.writes() {
            match self.target(&unit.source) {
                None => {
                    tracing::warn!(source = %unit.source, "write target missing, skipped");
                    emitted.disposition = Disposition::SkippedStale;
                }
                Some(path) => {
                    let checksum = blake3::hash(text.as_bytes());
                    let on_disk = std::fs::read(&path)
                        .map(|bytes| blake3::hash(&bytes))
                        .ok();
                    if on_disk == Some(checksum) {
                        tracing::debug!(path = %path.display(), "unchanged, not rewritten");
                        emitted.disposition = Disposition::Unchanged;
                    } else {
                        std::fs::write(&path, &text)
                            .map_err(|e| EngineError::io_error(&path, e))?;
                        tracing::info!(path = %path.display(), bytes = text.len(), "wrote source unit");
                        emitted.disposition = Disposition::Written;
                    }
                    unit.checksum = checksum;
                    emitted.path = Some(path);
                }
            }
        }

        if mode.returns() {
            emitted.contents = Some(text);
        }
        Ok(emitted)
    }
}
