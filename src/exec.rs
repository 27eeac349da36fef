//! External command execution.
//!
//! Every call to the package manager, the preference store, and hook
//! scripts goes through the [`Executor`] trait so the gateways can be
//! exercised in tests without spawning processes.
use anyhow::{Context as _, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Command, Output};

use crate::error::CiderError;

/// Result of a command execution.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, if the process was not killed by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Runs external programs.
pub trait Executor: Send + Sync {
    /// Run a command, capturing its output. Fails if it exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`CiderError::CommandFailed`] on a non-zero exit, or an I/O
    /// error if the program cannot be spawned.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command, capturing its output, without failing on non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns an error only if the program cannot be spawned.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command attached to the terminal (installs, downloads).
    ///
    /// # Errors
    ///
    /// Returns [`CiderError::CommandFailed`] on a non-zero exit.
    fn run_interactive(&self, program: &str, args: &[&str]) -> Result<()>;

    /// Run a shell command line with `sh -c` inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`CiderError::CommandFailed`] on a non-zero exit.
    fn run_shell(&self, dir: &Path, script: &str) -> Result<()>;

    /// Check if a program is available on `PATH`.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] backed by [`std::process::Command`].
///
/// Applies the bootstrap `env` overrides to every child process and, in
/// debug mode, logs each argv before spawning it.
#[derive(Debug, Default, Clone)]
pub struct SystemExecutor {
    env: BTreeMap<String, String>,
    debug: bool,
}

impl SystemExecutor {
    /// Create an executor with the given environment overrides.
    #[must_use]
    pub const fn new(env: BTreeMap<String, String>, debug: bool) -> Self {
        Self { env, debug }
    }

    fn command(&self, program: &str, args: &[&str]) -> Command {
        if self.debug {
            tracing::debug!("{}", argv(program, args).join(" "));
        }
        let mut cmd = Command::new(program);
        cmd.args(args).envs(&self.env);
        cmd
    }
}

fn argv(program: &str, args: &[&str]) -> Vec<String> {
    std::iter::once(program)
        .chain(args.iter().copied())
        .map(String::from)
        .collect()
}

fn failed(program: &str, args: &[&str], code: Option<i32>) -> anyhow::Error {
    CiderError::CommandFailed {
        argv: argv(program, args),
        code,
    }
    .into()
}

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let result = self.run_unchecked(program, args)?;
        if !result.success {
            let stderr = result.stderr.trim();
            if !stderr.is_empty() {
                tracing::debug!("{program}: {stderr}");
            }
            return Err(failed(program, args, result.code));
        }
        Ok(result)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let output = self
            .command(program, args)
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(ExecResult::from(output))
    }

    fn run_interactive(&self, program: &str, args: &[&str]) -> Result<()> {
        let status = self
            .command(program, args)
            .status()
            .with_context(|| format!("failed to execute: {program}"))?;
        if !status.success() {
            return Err(failed(program, args, status.code()));
        }
        Ok(())
    }

    fn run_shell(&self, dir: &Path, script: &str) -> Result<()> {
        if self.debug {
            tracing::debug!("sh -c {script}");
        }
        let status = Command::new("sh")
            .arg("-c")
            .arg(script)
            .current_dir(dir)
            .envs(&self.env)
            .status()
            .with_context(|| format!("failed to execute script in {}", dir.display()))?;
        if !status.success() {
            return Err(failed(script, &[], status.code()));
        }
        Ok(())
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
