//! Make zsh the operator's login shell.
use anyhow::Result;

use super::{Step, StepResult};
use crate::context::Context;
use crate::error::ToolError;

/// Target interactive shell.
const TARGET_SHELL: &str = "zsh";

/// System registry of approved login shells.
const ETC_SHELLS: &str = "/etc/shells";

/// Whether `shell_path` is listed in the given `/etc/shells` content.
///
/// Comparison is by whole line; comments and blanks are ignored.
#[must_use]
pub fn registered_in(shells_content: &str, shell_path: &str) -> bool {
    shells_content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .any(|l| l == shell_path)
}

/// Ensure the operator's login shell is zsh.
///
/// No-op when `$SHELL` already points at zsh. Registering the shell in
/// `/etc/shells` needs elevated privileges and is best-effort; a failed
/// `chsh` is reported with a remediation hint and the run continues.
#[derive(Debug, Clone, Copy)]
pub struct ConfigureShell;

impl Step for ConfigureShell {
    fn name(&self) -> &'static str {
        "Configure default shell"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        // Skip in CI environments where chsh requires authentication.
        let is_ci = std::env::var("CI").is_ok();
        ctx.executor.which(TARGET_SHELL) && !is_ci
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let current = std::env::var("SHELL").unwrap_or_default();
        if current.ends_with(&format!("/{TARGET_SHELL}")) {
            return Ok(StepResult::Skipped(format!(
                "login shell is already {TARGET_SHELL}"
            )));
        }

        if ctx.dry_run {
            ctx.log
                .dry_run(&format!("change login shell to {TARGET_SHELL}"));
            return Ok(StepResult::DryRun);
        }

        let result = ctx.executor.run("which", &[TARGET_SHELL])?;
        let shell_path = result.stdout.trim().to_string();

        ensure_registered(ctx, &shell_path);

        let chsh = ctx.executor.run_unchecked("chsh", &["-s", &shell_path])?;
        if !chsh.success {
            return Err(ToolError::ShellChange {
                reason: chsh.exit_details(),
                shell: shell_path,
            }
            .into());
        }

        ctx.log.info(&format!("login shell changed to {shell_path}"));
        Ok(StepResult::Ok)
    }
}

/// Append the shell to `/etc/shells` when missing.
///
/// Needs elevated privileges; failure is a warning, and `chsh` is still
/// attempted so the report names the command that actually blocks.
fn ensure_registered(ctx: &Context, shell_path: &str) {
    let content = std::fs::read_to_string(ETC_SHELLS).unwrap_or_default();
    if registered_in(&content, shell_path) {
        ctx.log.debug(&format!("{shell_path} already in {ETC_SHELLS}"));
        return;
    }

    ctx.log.info(&format!("registering {shell_path} in {ETC_SHELLS}"));
    let append = format!("echo {shell_path} >> {ETC_SHELLS}");
    match ctx.executor.run_unchecked("sudo", &["sh", "-c", &append]) {
        Ok(result) if result.success => {}
        Ok(result) => ctx.log.warn(&format!(
            "could not register {shell_path} in {ETC_SHELLS} ({})",
            result.exit_details()
        )),
        Err(e) => ctx
            .log
            .warn(&format!("could not register {shell_path}: {e:#}")),
    }
}
