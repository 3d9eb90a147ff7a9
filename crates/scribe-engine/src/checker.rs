//! External syntax checker capability
//!
//! [`SyntaxChecker`] is the seam between the validator and the host
//! toolchain. [`ProcessChecker`] runs a real interpreter; tests substitute
//! in-memory implementations.

use crate::error::CheckError;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Default checker program
pub const DEFAULT_PROGRAM: &str = "php";

/// Default checker timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Outcome of one checker run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    /// Exit status was zero
    pub success: bool,
    /// Exit code (`None` if killed by a signal)
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr
    pub output: String,
}

impl CheckReport {
    /// Successful run with no output
    #[inline]
    #[must_use]
    pub fn passed() -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            output: String::new(),
        }
    }

    /// Failed run with exit code and output
    #[inline]
    #[must_use]
    pub fn failed(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            output: output.into(),
        }
    }
}

/// Checks one file for syntax validity
pub trait SyntaxChecker {
    /// Run the check against `file`
    ///
    /// # Errors
    /// Returns [`CheckError`] when the check itself cannot complete. A file
    /// that fails the check is reported through [`CheckReport::success`].
    fn check(&self, file: &Path) -> Result<CheckReport, CheckError>;
}

impl<T: SyntaxChecker + ?Sized> SyntaxChecker for &T {
    fn check(&self, file: &Path) -> Result<CheckReport, CheckError> {
        (**self).check(file)
    }
}

impl<T: SyntaxChecker + ?Sized> SyntaxChecker for Box<T> {
    fn check(&self, file: &Path) -> Result<CheckReport, CheckError> {
        (**self).check(file)
    }
}

/// Runs `<program> <args…> <file>` as a subprocess
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessChecker {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    working_dir: Option<PathBuf>,
}

impl Default for ProcessChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessChecker {
    /// `php -f` with the default timeout
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            args: vec!["-f".to_string()],
            timeout: DEFAULT_TIMEOUT,
            working_dir: None,
        }
    }

    /// With program
    #[inline]
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// With arguments placed before the file
    #[inline]
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// With timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// With working directory (project root for the bootstrap require)
    #[inline]
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Program name
    #[inline]
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl SyntaxChecker for ProcessChecker {
    fn check(&self, file: &Path) -> Result<CheckReport, CheckError> {
        // Both streams share one anonymous file so output keeps its order
        let mut capture = tempfile::tempfile()?;
        let stdout = capture.try_clone()?;
        let stderr = capture.try_clone()?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(file)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| CheckError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= self.timeout {
                if let Err(e) = child.kill() {
                    tracing::debug!(error = %e, "checker exited before kill");
                }
                child.wait()?;
                tracing::warn!(
                    program = %self.program,
                    file = %file.display(),
                    timeout = ?self.timeout,
                    "checker timed out, killed"
                );
                return Err(CheckError::TimedOut {
                    program: self.program.clone(),
                    timeout: self.timeout,
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        capture.seek(SeekFrom::Start(0))?;
        let mut bytes = Vec::new();
        capture.read_to_end(&mut bytes)?;

        tracing::debug!(program = %self.program, code = ?status.code(), "checker finished");
        Ok(CheckReport {
            success: status.success(),
            exit_code: status.code(),
            output: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}
