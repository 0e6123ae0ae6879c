//! The installation orchestrator: idempotency probe, ordered strategy
//! fallback, and failure tolerance.
//!
//! Per tool, the state machine is `Probe -> AlreadyPresent | TryStrategy(i)`;
//! a failed strategy falls through to `TryStrategy(i+1)`, and exhausting the
//! list yields `Failed` without aborting the run. Nothing is retried within
//! a run: idempotency means re-invoking the whole program is the retry
//! mechanism.
use crate::config::{InstallStrategy, StrategyKind, ToolSpec};
use crate::context::Context;
use crate::pkg::Ecosystem;

/// Outcome of provisioning a single tool.
///
/// Aggregated into the run report; never persisted. Idempotency is re-derived
/// from host state on every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The probe binary already resolves on PATH.
    AlreadyPresent,
    /// A strategy of the given kind installed the tool.
    Installed(StrategyKind),
    /// No strategy applies on this platform; accepted, not an error.
    Skipped(String),
    /// Every applicable strategy failed.
    Failed(String),
    /// Dry-run mode; the tool would have been installed.
    DryRun,
}

/// Ensure the platform's ecosystem is usable, at most once per run.
///
/// Returns the available ecosystem, or `None` when the platform has no
/// package manager or its bootstrap failed earlier in this run. A bootstrap
/// failure is logged as a warning and remembered; the run continues with
/// ecosystem strategies inapplicable.
pub fn ensure_ecosystem(ctx: &Context) -> Option<Ecosystem> {
    let manager = ctx.manager.as_ref()?;
    let mut state = ctx.ecosystem_state();
    match state.ensured {
        Some(true) => Some(manager.ecosystem()),
        Some(false) => None,
        None => {
            match manager.ensure_present(ctx.executor.as_ref(), ctx.log.as_ref(), &ctx.platform) {
                Ok(()) => {
                    state.ensured = Some(true);
                    Some(manager.ecosystem())
                }
                Err(e) => {
                    ctx.log.warn(&format!(
                        "{} unavailable ({e:#}); continuing without ecosystem installs",
                        manager.ecosystem()
                    ));
                    state.ensured = Some(false);
                    None
                }
            }
        }
    }
}

/// Run the per-tool state machine for one [`ToolSpec`].
pub fn install_tool(ctx: &Context, spec: &ToolSpec) -> InstallOutcome {
    if ctx.executor.which(&spec.probe) {
        ctx.log.debug(&format!("{} already on PATH", spec.probe));
        return InstallOutcome::AlreadyPresent;
    }

    if ctx.dry_run {
        ctx.log.dry_run(&format!("install {}", spec.name));
        return InstallOutcome::DryRun;
    }

    let mut reasons = Vec::new();
    let mut attempted = false;
    for strategy in &spec.strategies {
        if !applicable(ctx, strategy) {
            continue;
        }
        attempted = true;
        match run_strategy(ctx, strategy) {
            Ok(()) => {
                ctx.log
                    .info(&format!("{} installed via {}", spec.name, strategy.kind()));
                return InstallOutcome::Installed(strategy.kind());
            }
            Err(reason) => {
                ctx.log
                    .warn(&format!("{} via {}: {reason}", spec.name, strategy.kind()));
                reasons.push(format!("{}: {reason}", strategy.kind()));
            }
        }
    }

    if attempted {
        InstallOutcome::Failed(reasons.join("; "))
    } else {
        InstallOutcome::Skipped("no applicable install strategy on this platform".to_string())
    }
}

/// Whether a strategy applies on this host right now.
///
/// Ecosystem strategies require the matching available ecosystem (which may
/// trigger its once-per-run bootstrap); source builds require the toolchain
/// on PATH; remote scripts are platform-agnostic.
fn applicable(ctx: &Context, strategy: &InstallStrategy) -> bool {
    match strategy {
        InstallStrategy::Package { ecosystem, .. } => ensure_ecosystem(ctx) == Some(*ecosystem),
        InstallStrategy::Script { .. } => true,
        InstallStrategy::Source { toolchain, .. } => ctx.executor.which(toolchain),
    }
}

/// Attempt a single strategy; a failure reason is a value, never an abort.
fn run_strategy(ctx: &Context, strategy: &InstallStrategy) -> Result<(), String> {
    match strategy {
        InstallStrategy::Package { package, .. } => {
            let manager = ctx.manager.as_ref().ok_or("no package manager")?;
            let mut state = ctx.ecosystem_state();
            manager
                .install(ctx.executor.as_ref(), ctx.log.as_ref(), package, &mut state)
                .map_err(|e| e.to_string())
        }
        InstallStrategy::Script { url, args } => run_remote_script(ctx, url, args),
        InstallStrategy::Source { toolchain, package } => {
            let result = ctx
                .executor
                .run_unchecked(toolchain, &["install", package])
                .map_err(|e| format!("{e:#}"))?;
            if result.success {
                Ok(())
            } else {
                Err(format!("{toolchain} install failed ({})", result.exit_details()))
            }
        }
    }
}

/// Fetch a remote installer script and pipe it to `sh`.
///
/// Prefers curl, falls back to wget; neither being present is a strategy
/// failure, not a run failure. The composed line runs through `sh -c` so
/// `$HOME`-style arguments expand on the host.
fn run_remote_script(ctx: &Context, url: &str, args: &[String]) -> Result<(), String> {
    let fetch = if ctx.executor.which("curl") {
        format!("curl -fsSL {url}")
    } else if ctx.executor.which("wget") {
        format!("wget -qO- {url}")
    } else {
        return Err("neither curl nor wget is available".to_string());
    };

    let mut line = format!("{fetch} | sh -s");
    if !args.is_empty() {
        line.push_str(" -- ");
        line.push_str(&args.join(" "));
    }

    let result = ctx
        .executor
        .run_unchecked("sh", &["-c", &line])
        .map_err(|e| format!("{e:#}"))?;
    if result.success {
        Ok(())
    } else {
        Err(format!("installer script failed ({})", result.exit_details()))
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::{Plan, ToolSpec};
    use crate::context::test_helpers::{make_context, make_context_with, single_tool_plan};
    use crate::exec::test_helpers::ScriptedExecutor;
    use crate::platform::OsFamily;

    fn brew_tool(name: &str, probe: &str, package: &str) -> ToolSpec {
        ToolSpec {
            name: name.to_string(),
            probe: probe.to_string(),
            strategies: vec![InstallStrategy::Package {
                ecosystem: Ecosystem::Homebrew,
                package: package.to_string(),
            }],
        }
    }

    fn script_strategy(url: &str) -> InstallStrategy {
        InstallStrategy::Script {
            url: url.to_string(),
            args: vec![],
        }
    }

    #[test]
    fn probe_hit_short_circuits_without_mutation() {
        let spec = brew_tool("fzf", "fzf", "fzf");
        let executor = Arc::new(ScriptedExecutor::new().with_available(&["fzf", "brew"]));
        let (ctx, _log) = make_context(
            single_tool_plan(spec.clone()),
            OsFamily::MacOs,
            Arc::clone(&executor),
        );
        assert_eq!(install_tool(&ctx, &spec), InstallOutcome::AlreadyPresent);
        assert!(executor.calls().is_empty(), "no command may be spawned");
        assert!(ctx.ecosystem_state().ensured.is_none(), "no ensure needed");
    }

    #[test]
    fn package_strategy_installs() {
        let spec = brew_tool("ripgrep", "rg", "ripgrep");
        let executor = Arc::new(ScriptedExecutor::new().with_available(&["brew"]));
        let (ctx, _log) = make_context(
            single_tool_plan(spec.clone()),
            OsFamily::MacOs,
            Arc::clone(&executor),
        );
        assert_eq!(
            install_tool(&ctx, &spec),
            InstallOutcome::Installed(StrategyKind::Package)
        );
        assert_eq!(
            executor.calls_matching("brew install ripgrep"),
            1,
            "package name, not probe name, goes to the manager"
        );
    }

    #[test]
    fn fallback_to_script_when_package_fails() {
        let spec = ToolSpec {
            name: "starship".to_string(),
            probe: "starship".to_string(),
            strategies: vec![
                InstallStrategy::Package {
                    ecosystem: Ecosystem::Homebrew,
                    package: "starship".to_string(),
                },
                script_strategy("https://starship.rs/install.sh"),
            ],
        };
        let executor = Arc::new(
            ScriptedExecutor::new()
                .with_available(&["brew", "curl"])
                .fail_on("brew install starship"),
        );
        let (ctx, _log) = make_context(
            single_tool_plan(spec.clone()),
            OsFamily::MacOs,
            Arc::clone(&executor),
        );
        assert_eq!(
            install_tool(&ctx, &spec),
            InstallOutcome::Installed(StrategyKind::Script)
        );
        assert_eq!(
            executor.calls_matching("starship.rs/install.sh"),
            1,
            "the fallback strategy must run exactly once"
        );
    }

    #[test]
    fn ecosystem_only_tool_skipped_on_other_platform() {
        let spec = brew_tool("fzf", "fzf", "fzf");
        let executor = Arc::new(ScriptedExecutor::new());
        let (ctx, _log) = make_context(
            single_tool_plan(spec.clone()),
            OsFamily::Other,
            Arc::clone(&executor),
        );
        let outcome = install_tool(&ctx, &spec);
        assert!(
            matches!(outcome, InstallOutcome::Skipped(_)),
            "expected Skipped, got {outcome:?}"
        );
        assert!(executor.calls().is_empty(), "no ecosystem call may happen");
    }

    #[test]
    fn all_strategies_exhausted_is_failed() {
        let spec = ToolSpec {
            name: "fzf".to_string(),
            probe: "fzf".to_string(),
            strategies: vec![
                InstallStrategy::Package {
                    ecosystem: Ecosystem::Homebrew,
                    package: "fzf".to_string(),
                },
                script_strategy("https://example.com/fzf.sh"),
            ],
        };
        let executor = Arc::new(
            ScriptedExecutor::new()
                .with_available(&["brew", "curl"])
                .fail_on("brew install fzf")
                .fail_on("fzf.sh"),
        );
        let (ctx, _log) = make_context(single_tool_plan(spec.clone()), OsFamily::MacOs, executor);
        let outcome = install_tool(&ctx, &spec);
        let InstallOutcome::Failed(reasons) = outcome else {
            panic!("expected Failed, got {outcome:?}");
        };
        assert!(reasons.contains("package:"));
        assert!(reasons.contains("script:"));
    }

    #[test]
    fn source_strategy_requires_toolchain() {
        let spec = ToolSpec {
            name: "sheldon".to_string(),
            probe: "sheldon".to_string(),
            strategies: vec![InstallStrategy::Source {
                toolchain: "cargo".to_string(),
                package: "sheldon".to_string(),
            }],
        };
        // cargo absent: the strategy is inapplicable, so the tool is skipped.
        let executor = Arc::new(ScriptedExecutor::new());
        let (ctx, _log) = make_context(single_tool_plan(spec.clone()), OsFamily::Other, executor);
        assert!(matches!(install_tool(&ctx, &spec), InstallOutcome::Skipped(_)));

        // cargo present: the strategy runs.
        let executor = Arc::new(ScriptedExecutor::new().with_available(&["cargo"]));
        let (ctx, _log) = make_context(
            single_tool_plan(spec.clone()),
            OsFamily::Other,
            Arc::clone(&executor),
        );
        assert_eq!(
            install_tool(&ctx, &spec),
            InstallOutcome::Installed(StrategyKind::Source)
        );
        assert_eq!(executor.calls_matching("cargo install sheldon"), 1);
    }

    #[test]
    fn dry_run_never_mutates() {
        let spec = brew_tool("fzf", "fzf", "fzf");
        let executor = Arc::new(ScriptedExecutor::new().with_available(&["brew"]));
        let (ctx, _log) = make_context_with(
            single_tool_plan(spec.clone()),
            OsFamily::MacOs,
            Arc::clone(&executor),
            true,
        );
        assert_eq!(install_tool(&ctx, &spec), InstallOutcome::DryRun);
        assert!(executor.calls().is_empty());
        assert!(
            ctx.ecosystem_state().ensured.is_none(),
            "dry run must not bootstrap the ecosystem"
        );
    }

    #[test]
    fn ensure_ecosystem_memoizes_bootstrap_failure() {
        let executor = Arc::new(ScriptedExecutor::new().fail_on("install.sh"));
        let (ctx, _log) = make_context(Plan::builtin(), OsFamily::MacOs, Arc::clone(&executor));
        assert_eq!(ensure_ecosystem(&ctx), None);
        assert_eq!(ctx.ecosystem_state().ensured, Some(false));
        // Second call must not re-attempt the bootstrap.
        assert_eq!(ensure_ecosystem(&ctx), None);
        assert_eq!(executor.calls_matching("install.sh"), 1);
    }

    #[test]
    fn ensure_ecosystem_none_on_other_platform() {
        let executor = Arc::new(ScriptedExecutor::new());
        let (ctx, _log) = make_context(Plan::builtin(), OsFamily::Other, executor);
        assert_eq!(ensure_ecosystem(&ctx), None);
    }

    #[test]
    fn script_strategy_falls_back_to_wget() {
        let spec = ToolSpec {
            name: "mise".to_string(),
            probe: "mise".to_string(),
            strategies: vec![script_strategy("https://mise.run")],
        };
        let executor = Arc::new(ScriptedExecutor::new().with_available(&["wget"]));
        let (ctx, _log) = make_context(
            single_tool_plan(spec.clone()),
            OsFamily::Other,
            Arc::clone(&executor),
        );
        assert_eq!(
            install_tool(&ctx, &spec),
            InstallOutcome::Installed(StrategyKind::Script)
        );
        assert_eq!(executor.calls_matching("wget -qO-"), 1);
    }

    #[test]
    fn script_strategy_fails_cleanly_without_fetch_tool() {
        let spec = ToolSpec {
            name: "mise".to_string(),
            probe: "mise".to_string(),
            strategies: vec![script_strategy("https://mise.run")],
        };
        let executor = Arc::new(ScriptedExecutor::new());
        let (ctx, _log) = make_context(single_tool_plan(spec.clone()), OsFamily::Other, executor);
        let outcome = install_tool(&ctx, &spec);
        let InstallOutcome::Failed(reasons) = outcome else {
            panic!("expected Failed, got {outcome:?}");
        };
        assert!(reasons.contains("neither curl nor wget"));
    }

    #[test]
    fn script_args_are_passed_after_separator() {
        let spec = ToolSpec {
            name: "chezmoi".to_string(),
            probe: "chezmoi".to_string(),
            strategies: vec![InstallStrategy::Script {
                url: "https://get.chezmoi.io".to_string(),
                args: vec!["-b".to_string(), "$HOME/.local/bin".to_string()],
            }],
        };
        let executor = Arc::new(ScriptedExecutor::new().with_available(&["curl"]));
        let (ctx, _log) = make_context(
            single_tool_plan(spec.clone()),
            OsFamily::Other,
            Arc::clone(&executor),
        );
        install_tool(&ctx, &spec);
        assert_eq!(
            executor.calls_matching("| sh -s -- -b $HOME/.local/bin"),
            1
        );
    }
}
