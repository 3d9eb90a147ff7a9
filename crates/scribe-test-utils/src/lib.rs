//! Testing utilities for the Scribe workspace
//!
//! Shared fixtures, a recording stub checker and scratch-project helpers.

#![allow(missing_docs)]

use scribe_engine::{CheckError, CheckReport, SyntaxChecker, Validator};
use scribe_manifest::Manifest;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Single class, no imports
pub const PLAIN_CLASS: &str = "<?php

namespace App\\Models;

class Post
{
}
";

/// Eloquent-style model with imports and members
pub const MODEL_WITH_IMPORTS: &str = "<?php

namespace App\\Models;

use Baz\\Bar;
use Illuminate\\Database\\Eloquent\\Model;

class User extends Model
{
    protected $table = 'users';

    public function bar(): Bar
    {
        return new Bar();
    }
}
";

/// Interface with one method
pub const INTERFACE: &str = "<?php

namespace App\\Contracts;

interface Repository
{
    public function find(int $id);
}
";

/// What the stub saw for one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// In-memory checker replying with a fixed report
#[derive(Debug)]
pub struct StubChecker {
    report: CheckReport,
    checked: RefCell<Vec<CheckedFile>>,
}

impl StubChecker {
    /// Always exits 0
    pub fn passing() -> Self {
        Self::with_report(CheckReport::passed())
    }

    /// Fails with `code` and `output`
    pub fn failing(code: i32, output: impl Into<String>) -> Self {
        Self::with_report(CheckReport::failed(code, output))
    }

    /// Reports a parse error on `line` of the checked file
    pub fn fatal(line: usize) -> Self {
        Self::failing(
            255,
            format!("PHP Parse error:  syntax error, unexpected token \"}}\" in checked.php on line {line}\n"),
        )
    }

    pub fn with_report(report: CheckReport) -> Self {
        Self {
            report,
            checked: RefCell::new(Vec::new()),
        }
    }

    /// Files checked so far
    pub fn checked(&self) -> Vec<CheckedFile> {
        self.checked.borrow().clone()
    }
}

impl SyntaxChecker for StubChecker {
    fn check(&self, file: &Path) -> Result<CheckReport, CheckError> {
        let contents = std::fs::read_to_string(file)?;
        self.checked.borrow_mut().push(CheckedFile {
            path: file.to_path_buf(),
            contents,
        });
        Ok(self.report.clone())
    }
}

/// Validator over `checker` with temp files under `temp_root`
pub fn validator<C: SyntaxChecker>(checker: C, temp_root: &Path) -> Validator<C> {
    Validator::new(checker).with_temp_root(temp_root)
}

/// Write `contents` to `dir/relative`, creating parent directories
pub fn write_source(dir: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}

/// Scratch project with sources registered in a manifest
pub struct Project {
    pub dir: tempfile::TempDir,
    pub manifest: Manifest,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            manifest: Manifest::new(),
        }
    }

    /// Add a class file and its manifest entry
    pub fn with_class(mut self, fqn: &str, contents: &str) -> Self {
        let relative = format!("src/{}.php", fqn.replace('\\', "/"));
        let path = write_source(self.dir.path(), &relative, contents);
        self.manifest.insert(fqn, path);
        self
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Temp root for validator files inside the project
    pub fn temp_root(&self) -> PathBuf {
        self.dir.path().join("tmp")
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}
