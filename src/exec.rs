//! External process execution behind a mockable trait.
use anyhow::{Context as _, Result, bail};
use std::process::{Command, Output};

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Captured standard output, lossily decoded.
    pub stdout: String,
    /// Captured standard error, lossily decoded.
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Raw exit code, if the process exited normally.
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

impl ExecResult {
    /// Exit details suitable for embedding in an error message: the exit code
    /// plus trimmed stderr (falling back to stdout when stderr is empty).
    #[must_use]
    pub fn exit_details(&self) -> String {
        let diag = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };
        format!("exit {}: {diag}", self.code.unwrap_or(-1))
    }
}

/// Abstraction over process spawning and PATH lookup.
///
/// The provisioning pipeline performs every host mutation through this trait
/// so tests can substitute a scripted implementation and assert on the exact
/// sequence of external calls.
pub trait Executor: Send + Sync {
    /// Run a command and return its output. Fails if the command exits
    /// non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned or exits non-zero.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command, capturing failure in the result instead of bailing.
    ///
    /// # Errors
    ///
    /// Returns an error only if the command cannot be spawned at all.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command with extra environment variables, capturing failure in
    /// the result.
    ///
    /// # Errors
    ///
    /// Returns an error only if the command cannot be spawned at all.
    fn run_unchecked_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<ExecResult>;

    /// Check if a program is resolvable on PATH.
    ///
    /// Pure lookup: never executes the program, never partially matches.
    /// This is the single idempotency probe for "already installed".
    fn which(&self, program: &str) -> bool;
}

/// Prepend `dir` to the process PATH so processes spawned later in this run
/// resolve binaries installed there without a shell restart.
///
/// No-op when `dir` is already a PATH component.
pub fn prepend_path(dir: &str) {
    let path = std::env::var("PATH").unwrap_or_default();
    if path.split(':').any(|p| p == dir) {
        return;
    }
    // SAFETY: the provisioning pipeline is single-threaded; no other thread
    // reads or writes the environment concurrently.
    #[allow(unsafe_code)]
    unsafe {
        std::env::set_var("PATH", format!("{dir}:{path}"));
    }
}

/// [`Executor`] backed by real process spawning and PATH resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl SystemExecutor {
    fn spawn(program: &str, args: &[&str], env: &[(&str, &str)]) -> Result<ExecResult> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        for (k, v) in env {
            cmd.env(k, v);
        }
        let output = cmd
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(ExecResult::from(output))
    }
}

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let result = Self::spawn(program, args, &[])?;
        if !result.success {
            bail!("{program} failed ({})", result.exit_details());
        }
        Ok(result)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        Self::spawn(program, args, &[])
    }

    fn run_unchecked_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<ExecResult> {
        Self::spawn(program, args, env)
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
