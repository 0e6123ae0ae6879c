//! The `status` subcommand: probe-only report of the plan.
use std::sync::Arc;

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::config::Plan;
use crate::exec::{Executor as _, SystemExecutor};
use crate::logging::Logger;

/// Report which planned tools are resolvable on PATH, without installing.
///
/// Uses the same idempotency probe as the install pipeline, so a tool shown
/// present here is exactly a tool `run` would leave untouched.
///
/// # Errors
///
/// Returns an error if the plan cannot be loaded.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let plan = Plan::load(global.plan.as_deref())?;
    let executor = SystemExecutor;

    log.stage("Tool status");
    let mut present = 0usize;
    for tool in &plan.tools {
        if executor.which(&tool.probe) {
            present += 1;
            log.info(&format!("\x1b[32m✓\x1b[0m {}", tool.name));
        } else {
            log.info(&format!("\x1b[31m✗\x1b[0m {} ({} not on PATH)", tool.name, tool.probe));
        }
    }
    log.info(&format!("{present} of {} tools present", plan.tools.len()));
    Ok(())
}
