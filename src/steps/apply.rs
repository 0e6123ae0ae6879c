//! Hand off to chezmoi: initialize from the chosen source and apply.
use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{Step, StepResult};
use crate::context::Context;
use crate::error::FatalError;

/// Marker file identifying the current directory as a local chezmoi source
/// working copy.
pub const LOCAL_MARKER: &str = ".chezmoiroot";

/// Where the configuration comes from, chosen once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationTarget {
    /// Initialize from a local working copy.
    LocalSource(PathBuf),
    /// Initialize from a remote repository URL.
    Remote(String),
}

/// The operator identity used to derive the remote repository URL.
///
/// `DOTFILES_USER` overrides; otherwise the invoking account's username
/// (`USER`, or `USERNAME` as a fallback).
///
/// # Errors
///
/// Returns an error when no identity can be determined from the environment.
pub fn operator_identity() -> Result<String> {
    for var in ["DOTFILES_USER", "USER", "USERNAME"] {
        if let Ok(value) = std::env::var(var)
            && !value.is_empty()
        {
            return Ok(value);
        }
    }
    anyhow::bail!("cannot determine operator identity: set DOTFILES_USER")
}

/// Choose the configuration source, deterministically.
///
/// A [`LOCAL_MARKER`] file in `cwd` selects the local working copy;
/// otherwise the remote URL is derived from the operator identity.
#[must_use]
pub fn resolve_target(cwd: &Path, operator: &str) -> ConfigurationTarget {
    if cwd.join(LOCAL_MARKER).exists() {
        ConfigurationTarget::LocalSource(cwd.to_path_buf())
    } else {
        ConfigurationTarget::Remote(format!("https://github.com/{operator}/dotfiles.git"))
    }
}

/// The chezmoi arguments for a resolved target.
///
/// Both branches request immediate application after initialization;
/// re-running `init --apply` is safe and convergent.
#[must_use]
pub fn apply_args(target: &ConfigurationTarget) -> Vec<String> {
    match target {
        ConfigurationTarget::LocalSource(path) => vec![
            "init".to_string(),
            "--apply".to_string(),
            "--source".to_string(),
            path.display().to_string(),
        ],
        ConfigurationTarget::Remote(url) => {
            vec!["init".to_string(), "--apply".to_string(), url.clone()]
        }
    }
}

/// Initialize chezmoi against the chosen source and apply the configuration.
///
/// Fatal: reaching this step successfully is the whole point of
/// provisioning, and chezmoi's own diagnostics are preserved verbatim on
/// failure.
#[derive(Debug, Clone, Copy)]
pub struct ApplyConfiguration;

impl Step for ApplyConfiguration {
    fn name(&self) -> &'static str {
        "Apply configuration"
    }

    fn fatal(&self) -> bool {
        true
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let cwd = std::env::current_dir()?;
        let operator = operator_identity()?;
        let target = resolve_target(&cwd, &operator);

        match &target {
            ConfigurationTarget::LocalSource(path) => {
                ctx.log
                    .info(&format!("applying from local source {}", path.display()));
            }
            ConfigurationTarget::Remote(url) => {
                ctx.log.info(&format!("applying from {url}"));
            }
        }

        let args = apply_args(&target);
        if ctx.dry_run {
            ctx.log.dry_run(&format!("chezmoi {}", args.join(" ")));
            return Ok(StepResult::DryRun);
        }

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let result = ctx.executor.run_unchecked("chezmoi", &arg_refs)?;
        if !result.success {
            let output = if result.stderr.is_empty() {
                result.stdout
            } else {
                result.stderr
            };
            return Err(FatalError::Apply { output }.into());
        }

        Ok(StepResult::Ok)
    }
}
