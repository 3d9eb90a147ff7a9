//! Engine configuration (TOML)
//!
//! ```toml
//! [printer]
//! indent = 4
//!
//! [validator]
//! bootstrap = 'require "vendor/autoload.php";'   # "" disables
//! temp_root = "/tmp/scribe"
//!
//! [checker]
//! program = "php"
//! args = ["-f"]
//! timeout_secs = 10
//!
//! [manifest]
//! root = "."
//! ```

use crate::checker::{ProcessChecker, SyntaxChecker, DEFAULT_PROGRAM, DEFAULT_TIMEOUT};
use crate::error::{EngineError, EngineResult};
use crate::validator::{Validator, DEFAULT_BOOTSTRAP, DEFAULT_FATAL_MARKERS};
use scribe_manifest::Manifest;
use scribe_model::{Printer, DEFAULT_INDENT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Scribe configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScribeConfig {
    /// Printer settings
    pub printer: PrinterConfig,
    /// Validator settings
    pub validator: ValidatorConfig,
    /// Checker process settings
    pub checker: CheckerConfig,
    /// Manifest source
    pub manifest: ManifestConfig,
}

/// Printer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    /// Indentation width in spaces
    pub indent: usize,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT,
        }
    }
}

/// Validator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Bootstrap directive; empty disables instrumentation
    pub bootstrap: String,
    /// Temp file directory (system temp `scribe/` when unset)
    pub temp_root: Option<PathBuf>,
    /// Fatal output prefixes
    pub fatal_markers: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            bootstrap: DEFAULT_BOOTSTRAP.to_string(),
            temp_root: None,
            fatal_markers: DEFAULT_FATAL_MARKERS.iter().map(|m| (*m).to_string()).collect(),
        }
    }
}

/// Checker process settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Program to run
    pub program: String,
    /// Arguments placed before the file
    pub args: Vec<String>,
    /// Timeout in seconds
    pub timeout_secs: u64,
    /// Working directory (manifest root when unset)
    pub working_dir: Option<PathBuf>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            args: vec!["-f".to_string()],
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            working_dir: None,
        }
    }
}

/// Manifest source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Project root holding `composer.json`
    pub root: PathBuf,
    /// Explicit classmap file, used instead of the project scan
    pub classmap: Option<PathBuf>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            classmap: None,
        }
    }
}

impl ScribeConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] for malformed TOML or invalid values.
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns [`EngineError::Io`] if the file cannot be read, otherwise as
    /// [`ScribeConfig::from_toml_str`].
    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| EngineError::io_error(path, e))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    fn validate(&self) -> EngineResult<()> {
        if self.checker.program.trim().is_empty() {
            return Err(EngineError::Config("checker.program must not be empty".into()));
        }
        if self.checker.timeout_secs == 0 {
            return Err(EngineError::Config("checker.timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// With project root
    #[inline]
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.manifest.root = root.into();
        self
    }

    /// With indentation width
    #[inline]
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.printer.indent = indent;
        self
    }

    /// With checker timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.checker.timeout_secs = secs;
        self
    }

    /// With temp root
    #[inline]
    #[must_use]
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.validator.temp_root = Some(root.into());
        self
    }

    /// Printer for these settings
    #[inline]
    #[must_use]
    pub fn printer(&self) -> Printer {
        Printer::new().with_indent(self.printer.indent)
    }

    /// Checker process for these settings
    #[must_use]
    pub fn process_checker(&self) -> ProcessChecker {
        let working_dir = self
            .checker
            .working_dir
            .clone()
            .unwrap_or_else(|| self.manifest.root.clone());
        ProcessChecker::new()
            .with_program(self.checker.program.clone())
            .with_args(self.checker.args.iter().cloned())
            .with_timeout(Duration::from_secs(self.checker.timeout_secs))
            .with_working_dir(working_dir)
    }

    /// Validator around `checker` for these settings
    #[must_use]
    pub fn validator<C: SyntaxChecker>(&self, checker: C) -> Validator<C> {
        let bootstrap = Some(self.validator.bootstrap.trim())
            .filter(|b| !b.is_empty())
            .map(str::to_string);
        let validator = Validator::new(checker)
            .with_bootstrap(bootstrap)
            .with_fatal_markers(self.validator.fatal_markers.iter().cloned());
        match &self.validator.temp_root {
            Some(root) => validator.with_temp_root(root),
            None => validator,
        }
    }

    /// Build the class manifest
    ///
    /// # Errors
    /// Returns [`EngineError::Manifest`] when the sources cannot be read.
    pub fn manifest(&self) -> EngineResult<Manifest> {
        let manifest = match &self.manifest.classmap {
            Some(classmap) => Manifest::load_classmap(&self.manifest.root.join(classmap))?,
            None => Manifest::from_project(&self.manifest.root)?,
        };
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_empty() {
        let config = ScribeConfig::from_toml_str("").expect("parse");
        assert_eq!(config, ScribeConfig::default());
        assert_eq!(config.printer().indent(), 4);
        assert_eq!(config.process_checker().program(), "php");
    }

    #[test]
    fn partial_sections() {
        let config = ScribeConfig::from_toml_str(
            r#"
            [printer]
            indent = 2

            [checker]
            program = "php8.2"
            timeout_secs = 3

            [validator]
            bootstrap = ""
            "#,
        )
        .expect("parse");

        assert_eq!(config.printer.indent, 2);
        assert_eq!(config.checker.args, vec!["-f"]);
        assert_eq!(config.process_checker().timeout(), Duration::from_secs(3));
        assert_eq!(config.validator.fatal_markers.len(), 4);
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = ScribeConfig::from_toml_str("[checker]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn rejects_malformed() {
        let err = ScribeConfig::from_toml_str("[printer\nindent = ").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn builder() {
        let config = ScribeConfig::new()
            .with_root("/srv/app")
            .with_indent(8)
            .with_temp_root("/var/tmp/scribe");

        assert_eq!(config.manifest.root, PathBuf::from("/srv/app"));
        assert_eq!(config.printer().indent(), 8);
        assert_eq!(
            config.validator(ProcessChecker::new()).temp_root(),
            Path::new("/var/tmp/scribe")
        );
    }
}
