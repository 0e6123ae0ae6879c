//! Install the full tool set, one tool at a time, failure-tolerant.
use anyhow::Result;

use super::{Step, StepResult};
use crate::config::ToolSpec;
use crate::context::Context;
use crate::error::ToolError;
use crate::installer::{self, InstallOutcome};
use crate::logging::StepStatus;

/// Record a per-tool outcome into the run report.
pub(crate) fn record_outcome(ctx: &Context, spec: &ToolSpec, outcome: &InstallOutcome) {
    let (status, message) = match outcome {
        InstallOutcome::AlreadyPresent => (StepStatus::Ok, Some("already installed".to_string())),
        InstallOutcome::Installed(kind) => (StepStatus::Ok, Some(format!("installed via {kind}"))),
        InstallOutcome::Skipped(reason) => (StepStatus::Skipped, Some(reason.clone())),
        InstallOutcome::Failed(reasons) => {
            let err = ToolError::StrategiesExhausted {
                tool: spec.name.clone(),
                reasons: reasons.clone(),
            };
            ctx.log.warn(&err.to_string());
            (StepStatus::Failed, Some(reasons.clone()))
        }
        InstallOutcome::DryRun => (StepStatus::DryRun, None),
    };
    ctx.log.record_step(&spec.name, status, message.as_deref());
}

/// Install every tool in the plan except the configuration tool, in declared
/// order.
///
/// Individual tool failures are recorded and the run continues; no single
/// missing optional tool aborts provisioning.
#[derive(Debug, Clone, Copy)]
pub struct InstallTools;

impl Step for InstallTools {
    fn name(&self) -> &'static str {
        "Install tools"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.plan.remaining_tools().is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let specs = ctx.plan.remaining_tools();
        ctx.log.debug(&format!("{} tools to process", specs.len()));

        for spec in specs {
            let outcome = installer::install_tool(ctx, spec);
            record_outcome(ctx, spec, &outcome);
        }

        if ctx.dry_run {
            return Ok(StepResult::DryRun);
        }
        Ok(StepResult::Ok)
    }
}
