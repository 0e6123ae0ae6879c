//! Post-apply shell-plugin lock, best-effort.
use anyhow::Result;

use super::{Step, StepResult};
use crate::context::Context;
use crate::error::ToolError;

/// Lock the sheldon plugin set after the configuration lands.
///
/// Best-effort: a failure is recorded in the report and the run still
/// succeeds.
#[derive(Debug, Clone, Copy)]
pub struct LockShellPlugins;

impl Step for LockShellPlugins {
    fn name(&self) -> &'static str {
        "Lock shell plugins"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.executor.which("sheldon")
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        if ctx.dry_run {
            ctx.log.dry_run("sheldon lock");
            return Ok(StepResult::DryRun);
        }

        let result = ctx.executor.run_unchecked("sheldon", &["lock"])?;
        if !result.success {
            return Err(ToolError::PluginLock {
                reason: result.exit_details(),
            }
            .into());
        }
        Ok(StepResult::Ok)
    }
}
