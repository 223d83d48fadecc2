//! External process execution.
//!
//! Strategies describe what to run as [`Invocation`]s and hand them to a
//! [`ToolRunner`]. [`ProcessRunner`] spawns real processes;
//! [`DryRunRunner`] only logs them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tracing::{debug, info};

use crate::error::{Result, ToolError};

/// One external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory for the command.
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// How a process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolStatus {
    pub code: Option<i32>,
    /// Terminating signal, on platforms that have them.
    pub signal: Option<i32>,
}

impl ToolStatus {
    pub fn success() -> Self {
        ToolStatus {
            code: Some(0),
            signal: None,
        }
    }

    pub fn exited(code: i32) -> Self {
        ToolStatus {
            code: Some(code),
            signal: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for ToolStatus {
    fn from(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        ToolStatus {
            code: status.code(),
            signal,
        }
    }
}

/// Captured result of a build step.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ToolStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Diagnostic text: stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        if !out.is_empty() && !out.ends_with('\n') && !self.stderr.is_empty() {
            out.push('\n');
        }
        out.push_str(&self.stderr);
        out
    }
}

/// Executes invocations on behalf of a strategy.
pub trait ToolRunner: fmt::Debug {
    /// Run a build step to completion, capturing its output.
    fn capture(&mut self, invocation: &Invocation) -> Result<ToolOutput>;

    /// Run a simulation with inherited stdio and report how it ended.
    fn stream(&mut self, invocation: &Invocation) -> Result<ToolStatus>;

    /// Whether invocations really execute. Dry runs leave the artifact
    /// cache untouched.
    fn executes(&self) -> bool {
        true
    }
}

/// Runs invocations as child processes.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).current_dir(&invocation.cwd);
        cmd
    }

    fn spawn_error(invocation: &Invocation, source: std::io::Error) -> ToolError {
        ToolError::Spawn {
            program: invocation.program.clone(),
            source,
        }
    }
}

impl ToolRunner for ProcessRunner {
    fn capture(&mut self, invocation: &Invocation) -> Result<ToolOutput> {
        debug!(command = %invocation, cwd = %invocation.cwd.display(), "running build step");
        let output = Self::command(invocation)
            .output()
            .map_err(|e| Self::spawn_error(invocation, e))?;
        Ok(ToolOutput {
            status: output.status.into(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn stream(&mut self, invocation: &Invocation) -> Result<ToolStatus> {
        debug!(command = %invocation, cwd = %invocation.cwd.display(), "running simulation");
        let status = Self::command(invocation)
            .status()
            .map_err(|e| Self::spawn_error(invocation, e))?;
        Ok(status.into())
    }
}

/// Logs invocations instead of executing them.
#[derive(Debug, Default)]
pub struct DryRunRunner;

impl ToolRunner for DryRunRunner {
    fn capture(&mut self, invocation: &Invocation) -> Result<ToolOutput> {
        info!(cwd = %invocation.cwd.display(), "would run: {invocation}");
        Ok(ToolOutput {
            status: ToolStatus::success(),
            stdout: String::new(),
            stderr: String::new(),
        })
    }

    fn stream(&mut self, invocation: &Invocation) -> Result<ToolStatus> {
        info!(cwd = %invocation.cwd.display(), "would run: {invocation}");
        Ok(ToolStatus::success())
    }

    fn executes(&self) -> bool {
        false
    }
}
