//! Error types for loading source text into the model

/// Errors while building a [`crate::SourceUnit`] from source text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Grammar could not be loaded into the parser
    #[error("failed to initialize parser: {0}")]
    ParserInit(String),

    /// Parser returned no syntax tree
    #[error("parser produced no syntax tree")]
    ParseFailed,

    /// Source text contains a syntax error
    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },

    /// Construct the structural model cannot hold
    #[error("unsupported construct '{construct}' at line {line}")]
    Unsupported { construct: String, line: usize },
}

impl ModelError {
    /// Create unsupported-construct error
    pub fn unsupported(construct: impl Into<String>, line: usize) -> Self {
        Self::Unsupported {
            construct: construct.into(),
            line,
        }
    }

    /// 1-based line the error points at, if any
    #[inline]
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Syntax { line, .. } | Self::Unsupported { line, .. } => Some(*line),
            Self::ParserInit(_) | Self::ParseFailed => None,
        }
    }
}

/// Result alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;
