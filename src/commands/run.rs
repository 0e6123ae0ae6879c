//! The `run` subcommand: the full provisioning pipeline.
use std::sync::Arc;

use anyhow::Result;

use crate::cli::{GlobalOpts, RunOpts};
use crate::config::Plan;
use crate::context::Context;
use crate::exec::SystemExecutor;
use crate::logging::{Log, Logger};
use crate::platform::Platform;
use crate::steps::{self, Step};

/// Run the provisioning pipeline.
///
/// The run as a whole succeeds even when individual optional tools fail;
/// only the fatal steps (directory layout, configuration-tool bootstrap,
/// configuration apply) abort with a non-zero exit.
///
/// # Errors
///
/// Returns an error if plan loading or a fatal step fails.
pub fn run(global: &GlobalOpts, opts: &RunOpts, log: &Arc<Logger>) -> Result<()> {
    let version = option_env!("PROVISION_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    log.info(&format!("provision {version}"));

    let platform = Platform::detect();
    log.info(&format!("platform: {} ({})", platform.family, platform.arch));

    log.stage("Loading plan");
    let plan = Plan::load(global.plan.as_deref())?;
    log.info(&format!("{} tools in plan", plan.tools.len()));

    let ctx = Context::new(
        plan,
        Arc::new(platform),
        Arc::clone(log) as Arc<dyn Log>,
        Arc::new(SystemExecutor),
        global.dry_run,
    )?;

    let all_steps = steps::all_steps();
    let steps_to_run = filter_steps(&all_steps, &opts.skip, &opts.only);

    for step in steps_to_run {
        steps::execute(step, &ctx)?;
    }

    log.print_summary();
    Ok(())
}

/// Apply `--skip` and `--only` keyword filters to the step list.
///
/// `--only` wins when both are given, matching by case-insensitive name
/// substring.
fn filter_steps<'a>(
    all: &'a [Box<dyn Step>],
    skip: &[String],
    only: &[String],
) -> Vec<&'a dyn Step> {
    all.iter()
        .filter(|s| {
            let name = s.name().to_lowercase();
            if !only.is_empty() {
                return only.iter().any(|o| name.contains(&o.to_lowercase()));
            }
            if !skip.is_empty() {
                return !skip.iter().any(|k| name.contains(&k.to_lowercase()));
            }
            true
        })
        .map(AsRef::as_ref)
        .collect()
}
