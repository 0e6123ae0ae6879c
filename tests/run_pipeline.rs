#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
#![allow(unsafe_code)] // set_var/remove_var require unsafe since Rust 1.83
//! Integration tests for the provisioning pipeline.
//!
//! These drive the real step list over a scripted executor that simulates
//! host state, exercising the fatal-vs-recoverable boundary, idempotency,
//! platform gating, and deterministic install order.

mod common;

use std::sync::Arc;

use common::{ScriptedExecutor, make_context};
use provision_cli::config::plan::CONFIG_TOOL;
use provision_cli::config::{InstallStrategy, Plan, ToolSpec};
use provision_cli::logging::StepStatus;
use provision_cli::pkg::Ecosystem;
use provision_cli::platform::OsFamily;
use provision_cli::steps;

/// Serializes environment mutation across tests in this binary.
static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Remove XDG overrides so the layout step stays inside the test home.
///
/// Must be called while holding `ENV_MUTEX`.
fn clear_xdg() {
    for var in [
        "XDG_CONFIG_HOME",
        "XDG_CACHE_HOME",
        "XDG_DATA_HOME",
        "XDG_STATE_HOME",
    ] {
        // SAFETY: test-only env var mutation; serialized via ENV_MUTEX.
        unsafe { std::env::remove_var(var) };
    }
}

fn apt_tool(name: &str) -> ToolSpec {
    ToolSpec {
        name: name.to_string(),
        probe: name.to_string(),
        strategies: vec![InstallStrategy::Package {
            ecosystem: Ecosystem::Apt,
            package: name.to_string(),
        }],
    }
}

fn config_tool_via_script() -> ToolSpec {
    ToolSpec {
        name: CONFIG_TOOL.to_string(),
        probe: "chezmoi".to_string(),
        strategies: vec![InstallStrategy::Script {
            url: "https://get.chezmoi.io".to_string(),
            args: vec![],
        }],
    }
}

fn test_plan(tools: &[&str]) -> Plan {
    let mut all = vec![config_tool_via_script()];
    all.extend(tools.iter().map(|t| apt_tool(t)));
    Plan { tools: all }
}

/// Run the pipeline the way the `run` command does: execute steps in order,
/// stopping at the first fatal failure.
fn drive_pipeline(ctx: &provision_cli::context::Context) -> anyhow::Result<()> {
    for step in steps::all_steps() {
        steps::execute(step.as_ref(), ctx)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Fatal vs. recoverable boundary
// ---------------------------------------------------------------------------

/// A failed configuration-tool bootstrap must abort the run before any later
/// step, with no install or apply call ever issued.
#[test]
fn bootstrap_failure_aborts_before_later_steps() {
    let _guard = ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    clear_xdg();
    let home = tempfile::tempdir().expect("tempdir");
    let executor = Arc::new(
        ScriptedExecutor::new()
            .with_available(&["apt-get", "curl"])
            .fail_on("get.chezmoi.io"),
    );
    let plan = test_plan(&["a-tool", "b-tool"]);
    let (ctx, log) = make_context(
        plan,
        OsFamily::LinuxApt,
        Arc::clone(&executor),
        home.path().to_path_buf(),
        false,
    );

    let err = drive_pipeline(&ctx).expect_err("bootstrap failure is fatal");
    assert!(
        err.to_string()
            .contains("failed to bootstrap the configuration tool")
    );

    assert_eq!(
        executor.calls_matching("apt-get install"),
        0,
        "no tool install may run after a fatal bootstrap"
    );
    assert_eq!(
        executor.calls_matching("chezmoi init"),
        0,
        "apply must never run after a fatal bootstrap"
    );
    assert_eq!(log.failure_count(), 2, "tool entry plus step entry");
}

/// A single failed optional tool must not prevent subsequent tools or the
/// configuration apply from running, and the run must succeed overall.
#[test]
fn optional_tool_failure_does_not_stop_the_run() {
    let _guard = ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    // SAFETY: test-only env var mutation; serialized via ENV_MUTEX.
    unsafe {
        std::env::set_var("DOTFILES_USER", "op")
    };
    clear_xdg();

    let home = tempfile::tempdir().expect("tempdir");
    let executor = Arc::new(
        ScriptedExecutor::new()
            .with_available(&["apt-get", "curl"])
            .on_success("get.chezmoi.io", "chezmoi")
            .fail_on("install -y b-tool"),
    );
    let plan = test_plan(&["a-tool", "b-tool", "c-tool"]);
    let (ctx, log) = make_context(
        plan,
        OsFamily::LinuxApt,
        Arc::clone(&executor),
        home.path().to_path_buf(),
        false,
    );

    drive_pipeline(&ctx).expect("optional tool failure is recoverable");

    // SAFETY: test-only env var mutation; serialized via ENV_MUTEX.
    unsafe {
        std::env::remove_var("DOTFILES_USER")
    };

    assert_eq!(
        executor.calls_matching("install -y c-tool"),
        1,
        "tools after the failed one still run"
    );
    assert_eq!(
        executor.calls_matching("chezmoi init --apply"),
        1,
        "apply still runs"
    );
    assert_eq!(log.failure_count(), 1, "exactly the failed tool is recorded");
}

// ---------------------------------------------------------------------------
// Idempotency
// ---------------------------------------------------------------------------

/// Running the full pipeline twice against the same simulated host yields
/// `AlreadyPresent` for every tool on the second run and no additional
/// mutating install calls.
#[test]
fn second_run_is_idempotent() {
    let _guard = ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    // SAFETY: test-only env var mutation; serialized via ENV_MUTEX.
    unsafe {
        std::env::set_var("DOTFILES_USER", "op")
    };
    clear_xdg();

    let home = tempfile::tempdir().expect("tempdir");
    let executor = Arc::new(
        ScriptedExecutor::new()
            .with_available(&["apt-get", "curl"])
            .on_success("get.chezmoi.io", "chezmoi")
            .on_success("install -y a-tool", "a-tool")
            .on_success("install -y b-tool", "b-tool"),
    );
    let plan = test_plan(&["a-tool", "b-tool"]);

    let (ctx, _log) = make_context(
        plan.clone(),
        OsFamily::LinuxApt,
        Arc::clone(&executor),
        home.path().to_path_buf(),
        false,
    );
    drive_pipeline(&ctx).expect("first run");
    let installs_after_first = executor.calls_matching("apt-get install")
        + executor.calls_matching("get.chezmoi.io");
    assert_eq!(installs_after_first, 3);

    let (ctx, log) = make_context(
        plan,
        OsFamily::LinuxApt,
        Arc::clone(&executor),
        home.path().to_path_buf(),
        false,
    );
    drive_pipeline(&ctx).expect("second run");

    // SAFETY: test-only env var mutation; serialized via ENV_MUTEX.
    unsafe {
        std::env::remove_var("DOTFILES_USER")
    };

    assert_eq!(
        executor.calls_matching("apt-get install") + executor.calls_matching("get.chezmoi.io"),
        installs_after_first,
        "second run must issue no additional install calls"
    );
    let tool_entries: Vec<_> = log
        .step_entries()
        .into_iter()
        .filter(|e| ["chezmoi", "a-tool", "b-tool"].contains(&e.name.as_str()))
        .collect();
    assert_eq!(tool_entries.len(), 3);
    assert!(
        tool_entries
            .iter()
            .all(|e| e.message.as_deref() == Some("already installed")),
        "every tool reports AlreadyPresent on the second run"
    );
}

// ---------------------------------------------------------------------------
// Platform gating
// ---------------------------------------------------------------------------

/// On an unrecognized platform, a tool with only an ecosystem strategy is
/// skipped without any ecosystem call; script-only tools still install.
#[test]
fn other_platform_disables_ecosystem_strategies() {
    let _guard = ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    // SAFETY: test-only env var mutation; serialized via ENV_MUTEX.
    unsafe {
        std::env::set_var("DOTFILES_USER", "op")
    };
    clear_xdg();

    let home = tempfile::tempdir().expect("tempdir");
    let executor = Arc::new(
        ScriptedExecutor::new()
            .with_available(&["curl"])
            .on_success("get.chezmoi.io", "chezmoi"),
    );
    let plan = test_plan(&["apt-only-tool"]);
    let (ctx, log) = make_context(
        plan,
        OsFamily::Other,
        Arc::clone(&executor),
        home.path().to_path_buf(),
        false,
    );

    drive_pipeline(&ctx).expect("skipped tools are not failures");

    // SAFETY: test-only env var mutation; serialized via ENV_MUTEX.
    unsafe {
        std::env::remove_var("DOTFILES_USER")
    };

    assert_eq!(executor.calls_matching("apt-get"), 0, "no ecosystem call");
    let entry = log
        .step_entries()
        .into_iter()
        .find(|e| e.name == "apt-only-tool")
        .expect("tool entry recorded");
    assert_eq!(entry.status, StepStatus::Skipped);
    assert_eq!(log.failure_count(), 0);
}

// ---------------------------------------------------------------------------
// Deterministic order
// ---------------------------------------------------------------------------

/// Tools are attempted strictly in declared plan order.
#[test]
fn tools_install_in_declared_order() {
    let _guard = ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    // SAFETY: test-only env var mutation; serialized via ENV_MUTEX.
    unsafe {
        std::env::set_var("DOTFILES_USER", "op")
    };
    clear_xdg();

    let home = tempfile::tempdir().expect("tempdir");
    let executor = Arc::new(
        ScriptedExecutor::new()
            .with_available(&["apt-get", "curl"])
            .on_success("get.chezmoi.io", "chezmoi"),
    );
    let plan = test_plan(&["a-tool", "b-tool", "c-tool"]);
    let (ctx, _log) = make_context(
        plan,
        OsFamily::LinuxApt,
        Arc::clone(&executor),
        home.path().to_path_buf(),
        false,
    );

    drive_pipeline(&ctx).expect("pipeline");

    // SAFETY: test-only env var mutation; serialized via ENV_MUTEX.
    unsafe {
        std::env::remove_var("DOTFILES_USER")
    };

    let installs: Vec<String> = executor
        .calls()
        .into_iter()
        .filter(|c| c.contains("apt-get install"))
        .collect();
    assert_eq!(installs.len(), 3);
    assert!(installs[0].ends_with("a-tool"));
    assert!(installs[1].ends_with("b-tool"));
    assert!(installs[2].ends_with("c-tool"));
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

/// A dry run never issues a mutating call and never fails.
#[test]
fn dry_run_is_pure_preview() {
    let _guard = ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    // SAFETY: test-only env var mutation; serialized via ENV_MUTEX.
    unsafe {
        std::env::set_var("DOTFILES_USER", "op")
    };
    clear_xdg();

    let home = tempfile::tempdir().expect("tempdir");
    let executor = Arc::new(ScriptedExecutor::new().with_available(&["apt-get", "curl"]));
    let plan = test_plan(&["a-tool"]);
    let (ctx, log) = make_context(
        plan,
        OsFamily::LinuxApt,
        Arc::clone(&executor),
        home.path().join("home"),
        true,
    );

    drive_pipeline(&ctx).expect("dry run");

    // SAFETY: test-only env var mutation; serialized via ENV_MUTEX.
    unsafe {
        std::env::remove_var("DOTFILES_USER")
    };

    assert!(executor.calls().is_empty(), "dry run spawns nothing");
    assert!(!home.path().join("home").exists(), "dry run creates nothing");
    assert_eq!(log.failure_count(), 0);
}
