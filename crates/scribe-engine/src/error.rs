//! Error types for the mutation engine
//!
//! Provides error handling for:
//! - Loading (source resolution, parsing)
//! - Mutation (import conflicts, inheritance, construct kinds)
//! - Validation (checker failures, syntax errors)
//! - Emission (write-back IO)

use crate::construct::ConstructKind;
use scribe_manifest::ManifestError;
use scribe_model::ModelError;
use std::path::PathBuf;
use std::time::Duration;

/// Errors raised by engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Symbolic source has no manifest entry
    #[error("cannot resolve source '{name}': not in class manifest")]
    UnresolvedSource { name: String },

    /// Import alias already bound to a different name
    #[error("cannot import {import} into namespace '{namespace}': alias '{alias}' already refers to {existing}")]
    AmbiguousImport {
        import: String,
        existing: String,
        alias: String,
        namespace: String,
    },

    /// Class already has a different base class
    #[error("{type_name} already extends {existing}; cannot also extend {requested}")]
    MultipleInheritance {
        type_name: String,
        existing: String,
        requested: String,
    },

    /// Rename would give an element the name of a sibling
    #[error("{type_name} would contain {kind} '{name}' twice")]
    DuplicateElement {
        type_name: String,
        kind: ConstructKind,
        name: String,
    },

    /// Unknown construct kind requested from find/modify
    #[error("unsupported construct kind: '{0}'")]
    UnsupportedConstruct(String),

    /// Checker reported a fatal/parse error
    ///
    /// `message` is the line carrying the fatal marker; `output` is everything
    /// the checker printed.
    #[error("syntax error in {}{}: {message}", path.display(), line.map(|l| format!(" on line {l}")).unwrap_or_default())]
    Syntax {
        message: String,
        output: String,
        path: PathBuf,
        line: Option<usize>,
    },

    /// Checker failed without a recognizable fatal marker
    #[error("validation failed (exit code {}): {output}", exit_code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    Validation {
        exit_code: Option<i32>,
        output: String,
    },

    /// Checker could not run
    #[error("checker error: {0}")]
    Check(#[from] CheckError),

    /// Source file could not be loaded into the model
    #[error("failed to load {}: {source}", path.display())]
    Model {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    /// Manifest construction failed
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// IO error on a source, target or temp file
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EngineError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create ambiguous-import error
    pub fn ambiguous_import(
        import: impl Into<String>,
        existing: impl Into<String>,
        alias: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self::AmbiguousImport {
            import: import.into(),
            existing: existing.into(),
            alias: alias.into(),
            namespace: namespace.into(),
        }
    }

    /// Create duplicate-element error
    pub fn duplicate_element(
        type_name: impl Into<String>,
        kind: ConstructKind,
        name: impl Into<String>,
    ) -> Self {
        Self::DuplicateElement {
            type_name: type_name.into(),
            kind,
            name: name.into(),
        }
    }

    /// Create multiple-inheritance error
    pub fn multiple_inheritance(
        type_name: impl Into<String>,
        existing: impl Into<String>,
        requested: impl Into<String>,
    ) -> Self {
        Self::MultipleInheritance {
            type_name: type_name.into(),
            existing: existing.into(),
            requested: requested.into(),
        }
    }
}

/// Errors from running the external syntax checker
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// Checker process could not be started
    #[error("failed to spawn checker '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Checker exceeded its time budget and was killed
    #[error("checker '{program}' timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    /// IO error capturing checker output
    #[error("checker io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
