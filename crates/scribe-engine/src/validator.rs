//! Validation gate: instrument, write temp file, run checker
//!
//! The bootstrap directive lets the checker autoload project classes. It is
//! inserted into the checked copy only; callers always get the original text
//! back on success.

use crate::checker::SyntaxChecker;
use crate::error::{EngineError, EngineResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Directive inserted ahead of the checked code
pub const DEFAULT_BOOTSTRAP: &str = "require \"vendor/autoload.php\";";

/// Output prefixes that identify a fatal or parse error
pub const DEFAULT_FATAL_MARKERS: &[&str] = &[
    "PHP Fatal error:",
    "PHP Parse error:",
    "Fatal error:",
    "Parse error:",
];

static ON_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"on line (\d+)").expect("line number pattern"));

/// Instrumented text plus the 1-based line holding the bootstrap
struct Instrumented {
    text: String,
    bootstrap_line: Option<usize>,
}

/// Checks serialized text through a [`SyntaxChecker`]
#[derive(Debug, Clone)]
pub struct Validator<C> {
    checker: C,
    bootstrap: Option<String>,
    temp_root: PathBuf,
    fatal_markers: Vec<String>,
}

impl<C: SyntaxChecker> Validator<C> {
    /// Create validator with the default bootstrap and temp root
    #[must_use]
    pub fn new(checker: C) -> Self {
        Self {
            checker,
            bootstrap: Some(DEFAULT_BOOTSTRAP.to_string()),
            temp_root: default_temp_root(),
            fatal_markers: DEFAULT_FATAL_MARKERS.iter().map(|m| (*m).to_string()).collect(),
        }
    }

    /// With bootstrap directive (`None` disables instrumentation)
    #[inline]
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: Option<String>) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// With temp root directory
    #[inline]
    #[must_use]
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = root.into();
        self
    }

    /// With fatal output markers
    #[inline]
    #[must_use]
    pub fn with_fatal_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fatal_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Underlying checker
    #[inline]
    #[must_use]
    pub fn checker(&self) -> &C {
        &self.checker
    }

    /// Directory that receives temp files
    #[inline]
    #[must_use]
    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Validate `text`, returning it unchanged on success
    ///
    /// # Errors
    /// - [`EngineError::Syntax`] when the checker reports a fatal error
    /// - [`EngineError::Validation`] for any other non-zero exit
    /// - [`EngineError::Check`] when the checker cannot run
    /// - [`EngineError::Io`] when the temp file cannot be written
    pub fn validate(&self, text: &str) -> EngineResult<String> {
        let instrumented = self.instrument(text);

        std::fs::create_dir_all(&self.temp_root)
            .map_err(|e| EngineError::io_error(&self.temp_root, e))?;
        let mut file = tempfile::Builder::new()
            .prefix("scribe-")
            .suffix(".php")
            .tempfile_in(&self.temp_root)
            .map_err(|e| EngineError::io_error(&self.temp_root, e))?;
        let path = file.path().to_path_buf();
        file.write_all(instrumented.text.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| EngineError::io_error(&path, e))?;

        // `file` is dropped (and deleted) on every return below
        let report = self.checker.check(&path)?;
        if report.success {
            tracing::debug!(file = %path.display(), "validation passed");
            return Ok(text.to_string());
        }

        let output = report.output.trim_start();
        if self.fatal_markers.iter().any(|m| output.starts_with(m.as_str())) {
            let message = output.lines().next().unwrap_or_default().trim().to_string();
            let line = ON_LINE
                .captures(output)
                .and_then(|c| c[1].parse::<usize>().ok())
                .map(|line| map_line(line, instrumented.bootstrap_line));
            tracing::debug!(file = %path.display(), ?line, "checker reported fatal error");
            return Err(EngineError::Syntax {
                message,
                output: report.output.trim().to_string(),
                path,
                line,
            });
        }

        Err(EngineError::Validation {
            exit_code: report.exit_code,
            output: report.output,
        })
    }

    fn instrument(&self, text: &str) -> Instrumented {
        let Some(bootstrap) = &self.bootstrap else {
            return Instrumented {
                text: text.to_string(),
                bootstrap_line: None,
            };
        };

        let mut lines: Vec<&str> = text.lines().collect();
        let at = split_index(&lines);
        lines.insert(at.min(lines.len()), bootstrap);

        let mut out = lines.join("\n");
        out.push('\n');
        Instrumented {
            text: out,
            bootstrap_line: Some(at + 1),
        }
    }
}

/// Column-0 starts of the first type declaration or its doc block
const DECLARATION_STARTS: &[&str] = &[
    "/**", "#[", "abstract ", "final ", "readonly ", "class ", "interface ", "trait ", "enum ",
    "function ",
];

/// Index of the line the bootstrap is inserted before
///
/// Only the file header is searched: column-0 lines ahead of the first
/// declaration.
fn split_index(lines: &[&str]) -> usize {
    let header = lines
        .iter()
        .position(|line| DECLARATION_STARTS.iter().any(|start| line.starts_with(start)))
        .unwrap_or(lines.len());
    let after = |keyword: &str| {
        lines[..header]
            .iter()
            .position(|line| opens_statement(line, keyword))
            .map(|i| i + 1)
    };
    after("namespace")
        .or_else(|| after("declare"))
        .unwrap_or(1)
}

/// `line` starts at column 0 with the statement keyword
fn opens_statement(line: &str, keyword: &str) -> bool {
    line.strip_prefix(keyword)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|next| next.is_whitespace() || matches!(next, '(' | '{' | ';'))
}

/// Map a checker line number back to the un-instrumented text
fn map_line(line: usize, bootstrap_line: Option<usize>) -> usize {
    match bootstrap_line {
        Some(inserted) if line > inserted => line - 1,
        _ => line,
    }
}

fn default_temp_root() -> PathBuf {
    std::env::temp_dir().join("scribe")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::CheckReport;
    use crate::error::CheckError;
    use std::cell::RefCell;

    /// Records the instrumented text, replies with a fixed report
    struct Recording {
        report: CheckReport,
        seen: RefCell<Vec<(PathBuf, String)>>,
    }

    impl Recording {
        fn new(report: CheckReport) -> Self {
            Self {
                report,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl SyntaxChecker for Recording {
        fn check(&self, file: &Path) -> Result<CheckReport, CheckError> {
            let text = std::fs::read_to_string(file)?;
            self.seen.borrow_mut().push((file.to_path_buf(), text));
            Ok(self.report.clone())
        }
    }

    const SOURCE: &str = "<?php\n\nnamespace App;\n\nclass A\n{\n}\n";

    fn validator(report: CheckReport, root: &Path) -> Validator<Recording> {
        Validator::new(Recording::new(report)).with_temp_root(root)
    }

    #[test]
    fn bootstrap_after_namespace() {
        let dir = tempfile::tempdir().expect("tempdir");
        let validator = validator(CheckReport::passed(), dir.path());

        let out = validator.validate(SOURCE).expect("validate");

        assert_eq!(out, SOURCE);
        let seen = validator.checker().seen.borrow();
        assert_eq!(
            seen[0].1,
            "<?php\n\nnamespace App;\nrequire \"vendor/autoload.php\";\n\nclass A\n{\n}\n"
        );
        assert!(!seen[0].0.exists());
    }

    #[test]
    fn bootstrap_after_declare_without_namespace() {
        let lines = ["<?php", "", "declare(strict_types=1);", "", "class A"];
        assert_eq!(split_index(&lines), 3);
        assert_eq!(split_index(&["<?php", "class A"]), 1);
    }

    #[test]
    fn bootstrap_ignores_body_statements() {
        let lines = [
            "<?php",
            "",
            "class A",
            "{",
            "    public function f()",
            "    {",
            "        declare(ticks=1);",
            "namespace\\f();",
            "    }",
            "}",
        ];
        assert_eq!(split_index(&lines), 1);

        let relative = ["<?php", "namespace\\helper();", "namespace App;", "", "class A"];
        assert_eq!(split_index(&relative), 3);

        let documented = ["<?php", "", "/**", " * namespace Fake;", " */", "class A"];
        assert_eq!(split_index(&documented), 1);
    }

    #[test]
    fn bootstrap_disabled() {
        let dir = tempfile::tempdir().expect("tempdir");
        let validator = validator(CheckReport::passed(), dir.path()).with_bootstrap(None);

        validator.validate(SOURCE).expect("validate");

        assert_eq!(validator.checker().seen.borrow()[0].1, SOURCE);
    }

    #[test]
    fn fatal_output_maps_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = CheckReport::failed(
            255,
            "PHP Parse error:  syntax error, unexpected '}' in /tmp/x.php on line 8\nErrors parsing /tmp/x.php\n",
        );
        let validator = validator(report, dir.path());

        let err = validator.validate(SOURCE).unwrap_err();

        match err {
            EngineError::Syntax { message, output, line, path } => {
                assert!(message.starts_with("PHP Parse error:"));
                assert!(!message.contains("Errors parsing"));
                assert!(output.ends_with("Errors parsing /tmp/x.php"));
                assert_eq!(line, Some(7));
                assert!(!path.exists());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unrecognized_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let validator = validator(CheckReport::failed(1, "Could not open input file"), dir.path());

        let err = validator.validate(SOURCE).unwrap_err();

        assert!(matches!(err, EngineError::Validation { exit_code: Some(1), .. }));
    }

    #[test]
    fn creates_temp_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("nested/scribe");
        let validator = validator(CheckReport::passed(), &root);

        validator.validate(SOURCE).expect("validate");

        assert!(root.is_dir());
        assert_eq!(std::fs::read_dir(&root).expect("read_dir").count(), 0);
    }

    #[test]
    fn line_mapping() {
        assert_eq!(map_line(3, Some(4)), 3);
        assert_eq!(map_line(4, Some(4)), 4);
        assert_eq!(map_line(9, Some(4)), 8);
        assert_eq!(map_line(9, None), 9);
    }
}
