//! Acquire the configuration-application tool itself.
//!
//! This is the one install whose failure is fatal: the rest of the pipeline
//! is meaningless without the tool that materializes the operator's
//! configuration.
use anyhow::Result;

use super::tools::record_outcome;
use super::{Step, StepResult};
use crate::context::Context;
use crate::error::FatalError;
use crate::installer::{self, InstallOutcome};

/// Bootstrap the configuration tool (chezmoi) before any other install.
#[derive(Debug, Clone, Copy)]
pub struct BootstrapConfigTool;

impl Step for BootstrapConfigTool {
    fn name(&self) -> &'static str {
        "Bootstrap configuration tool"
    }

    fn fatal(&self) -> bool {
        true
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.plan.config_tool().is_some()
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let Some(spec) = ctx.plan.config_tool() else {
            return Ok(StepResult::Skipped(
                "plan declares no configuration tool".to_string(),
            ));
        };

        // Ensure the ecosystem once, before any per-tool install. A failed
        // bootstrap of the package manager is not fatal by itself; the
        // config tool may still arrive via its script strategy.
        if !ctx.dry_run {
            installer::ensure_ecosystem(ctx);
        }

        let outcome = installer::install_tool(ctx, spec);
        record_outcome(ctx, spec, &outcome);

        match outcome {
            InstallOutcome::AlreadyPresent | InstallOutcome::Installed(_) => Ok(StepResult::Ok),
            InstallOutcome::DryRun => Ok(StepResult::DryRun),
            InstallOutcome::Skipped(reason) | InstallOutcome::Failed(reason) => {
                Err(FatalError::Bootstrap { reason }.into())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::{InstallStrategy, Plan, ToolSpec, plan::CONFIG_TOOL};
    use crate::context::test_helpers::{make_context, make_context_with};
    use crate::exec::test_helpers::ScriptedExecutor;
    use crate::pkg::Ecosystem;
    use crate::platform::OsFamily;

    fn config_tool_plan(strategies: Vec<InstallStrategy>) -> Plan {
        Plan {
            tools: vec![ToolSpec {
                name: CONFIG_TOOL.to_string(),
                probe: "chezmoi".to_string(),
                strategies,
            }],
        }
    }

    fn brew_strategy() -> InstallStrategy {
        InstallStrategy::Package {
            ecosystem: Ecosystem::Homebrew,
            package: "chezmoi".to_string(),
        }
    }

    fn script_strategy() -> InstallStrategy {
        InstallStrategy::Script {
            url: "https://get.chezmoi.io".to_string(),
            args: vec![],
        }
    }

    #[test]
    fn already_present_is_ok() {
        let executor = Arc::new(ScriptedExecutor::new().with_available(&["chezmoi"]));
        let plan = config_tool_plan(vec![brew_strategy()]);
        let (ctx, _log) = make_context(plan, OsFamily::MacOs, executor);
        let result = BootstrapConfigTool.run(&ctx).expect("present tool is ok");
        assert_eq!(result, StepResult::Ok);
    }

    #[test]
    fn install_via_fallback_script_is_ok() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .with_available(&["brew", "curl"])
                .fail_on("brew install chezmoi"),
        );
        let plan = config_tool_plan(vec![brew_strategy(), script_strategy()]);
        let (ctx, _log) = make_context(plan, OsFamily::MacOs, executor);
        let result = BootstrapConfigTool.run(&ctx).expect("script fallback");
        assert_eq!(result, StepResult::Ok);
    }

    #[test]
    fn exhausted_strategies_are_fatal() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .with_available(&["brew", "curl"])
                .fail_on("brew install chezmoi")
                .fail_on("get.chezmoi.io"),
        );
        let plan = config_tool_plan(vec![brew_strategy(), script_strategy()]);
        let (ctx, _log) = make_context(plan, OsFamily::MacOs, executor);
        let err = BootstrapConfigTool.run(&ctx).expect_err("must be fatal");
        assert!(
            err.to_string()
                .contains("failed to bootstrap the configuration tool")
        );
    }

    #[test]
    fn unsupported_platform_with_only_ecosystem_strategy_is_fatal() {
        let executor = Arc::new(ScriptedExecutor::new());
        let plan = config_tool_plan(vec![brew_strategy()]);
        let (ctx, _log) = make_context(plan, OsFamily::Other, executor);
        let err = BootstrapConfigTool.run(&ctx).expect_err("nothing applies");
        assert!(err.to_string().contains("no applicable install strategy"));
    }

    #[test]
    fn dry_run_is_not_fatal() {
        let executor = Arc::new(ScriptedExecutor::new().with_available(&["brew"]));
        let plan = config_tool_plan(vec![brew_strategy()]);
        let (ctx, _log) = make_context_with(plan, OsFamily::MacOs, executor, true);
        let result = BootstrapConfigTool.run(&ctx).expect("dry run");
        assert_eq!(result, StepResult::DryRun);
    }

    #[test]
    fn step_is_fatal() {
        assert!(BootstrapConfigTool.fatal());
    }
}
