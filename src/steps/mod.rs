//! The fixed provisioning pipeline, one step at a time.
pub mod apply;
pub mod bootstrap;
pub mod layout;
pub mod plugins;
pub mod shell;
pub mod tools;

use anyhow::Result;

use crate::context::Context;
use crate::logging::StepStatus;

/// Result of a step that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// The step applied its changes (or found nothing to change).
    Ok,
    /// The step decided not to act, with a reason.
    Skipped(String),
    /// Dry-run mode; changes were previewed, not applied.
    DryRun,
}

/// A named, sequential provisioning step.
///
/// Steps run in the fixed order returned by [`all_steps`]; there is no
/// dependency graph because package managers serialize access to their own
/// state and a deterministic, human-readable run log is part of the
/// contract.
pub trait Step: Send + Sync {
    /// Human-readable step name.
    fn name(&self) -> &'static str;

    /// Whether a failure of this step aborts the whole run.
    ///
    /// Non-fatal failures are recorded in the run report and the pipeline
    /// continues.
    fn fatal(&self) -> bool {
        false
    }

    /// Whether this step should run on the current platform/plan.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the step.
    ///
    /// # Errors
    ///
    /// Returns an error if the step fails; [`execute`] decides whether that
    /// aborts the run based on [`Step::fatal`].
    fn run(&self, ctx: &Context) -> Result<StepResult>;
}

/// The complete pipeline, in execution order.
///
/// Order is load-bearing: directories before anything that writes into them,
/// the configuration tool before the steps that need it, apply before the
/// plugin lock.
#[must_use]
pub fn all_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(layout::EnsureDirectories),
        Box::new(bootstrap::BootstrapConfigTool),
        Box::new(tools::InstallTools),
        Box::new(shell::ConfigureShell),
        Box::new(apply::ApplyConfiguration),
        Box::new(plugins::LockShellPlugins),
    ]
}

/// Execute a step, recording the result in the run report.
///
/// # Errors
///
/// Returns an error only when a step marked [`Step::fatal`] fails; every
/// other failure becomes a report entry plus an error log line.
pub fn execute(step: &dyn Step, ctx: &Context) -> Result<()> {
    if !step.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping step: {} (not applicable)", step.name()));
        ctx.log
            .record_step(step.name(), StepStatus::NotApplicable, None);
        return Ok(());
    }

    ctx.log.stage(step.name());

    match step.run(ctx) {
        Ok(StepResult::Ok) => {
            ctx.log.record_step(step.name(), StepStatus::Ok, None);
        }
        Ok(StepResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            ctx.log
                .record_step(step.name(), StepStatus::Skipped, Some(&reason));
        }
        Ok(StepResult::DryRun) => {
            ctx.log.record_step(step.name(), StepStatus::DryRun, None);
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", step.name()));
            ctx.log
                .record_step(step.name(), StepStatus::Failed, Some(&format!("{e:#}")));
            if step.fatal() {
                return Err(e);
            }
        }
    }
    Ok(())
}
