// Shared helpers for integration tests.
//
// Provides a scripted executor that simulates host state (PATH contents,
// command outcomes, install side effects) and a context factory, so each
// integration test can drive the real pipeline without spawning processes.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use provision_cli::config::Plan;
use provision_cli::context::Context;
use provision_cli::exec::{ExecResult, Executor};
use provision_cli::logging::Logger;
use provision_cli::pkg::{self, EcosystemState};
use provision_cli::platform::{OsFamily, Platform};

/// A scripted [`Executor`] simulating host state.
///
/// Every spawned command succeeds unless its joined command line contains a
/// configured failure substring. A successful command whose line matches an
/// effect substring adds the effect's probe name to the simulated PATH, so
/// "install succeeded" is observable by the next idempotency probe exactly
/// as on a real host.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    available: Mutex<HashSet<String>>,
    fail_matching: Vec<String>,
    effects: Vec<(String, String)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    /// Create an executor with nothing on the simulated PATH.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark programs as present on the simulated PATH.
    pub fn with_available(self, programs: &[&str]) -> Self {
        if let Ok(mut guard) = self.available.lock() {
            for p in programs {
                guard.insert((*p).to_string());
            }
        }
        self
    }

    /// Fail every command whose joined command line contains `needle`.
    pub fn fail_on(mut self, needle: &str) -> Self {
        self.fail_matching.push(needle.to_string());
        self
    }

    /// After a successful command containing `needle`, add `probe` to the
    /// simulated PATH.
    pub fn on_success(mut self, needle: &str, probe: &str) -> Self {
        self.effects.push((needle.to_string(), probe.to_string()));
        self
    }

    /// All recorded command lines, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Number of recorded command lines containing `needle`.
    pub fn calls_matching(&self, needle: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(needle)).count()
    }

    fn record(&self, program: &str, args: &[&str]) -> ExecResult {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        if let Ok(mut guard) = self.calls.lock() {
            guard.push(line.clone());
        }
        let success = !self.fail_matching.iter().any(|n| line.contains(n));
        if success {
            for (needle, probe) in &self.effects {
                if line.contains(needle) {
                    if let Ok(mut guard) = self.available.lock() {
                        guard.insert(probe.clone());
                    }
                }
            }
        }
        ExecResult {
            stdout: String::new(),
            stderr: if success {
                String::new()
            } else {
                "simulated failure".to_string()
            },
            success,
            code: Some(i32::from(!success)),
        }
    }
}

impl Executor for ScriptedExecutor {
    fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        let result = self.record(program, args);
        if !result.success {
            anyhow::bail!("{program} failed ({})", result.exit_details());
        }
        Ok(result)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        Ok(self.record(program, args))
    }

    fn run_unchecked_with_env(
        &self,
        program: &str,
        args: &[&str],
        _env: &[(&str, &str)],
    ) -> anyhow::Result<ExecResult> {
        Ok(self.record(program, args))
    }

    fn which(&self, program: &str) -> bool {
        self.available.lock().is_ok_and(|g| g.contains(program))
    }
}

/// Build a [`Context`] over a scripted executor and an isolated home
/// directory.
pub fn make_context(
    plan: Plan,
    family: OsFamily,
    executor: Arc<ScriptedExecutor>,
    home: PathBuf,
    dry_run: bool,
) -> (Context, Arc<Logger>) {
    let platform = Arc::new(Platform::new(family, "x86_64"));
    let log = Arc::new(Logger::new());
    let ctx = Context {
        plan,
        platform: Arc::clone(&platform),
        log: Arc::clone(&log) as Arc<dyn provision_cli::logging::Log>,
        executor: executor as Arc<dyn Executor>,
        dry_run,
        home,
        manager: pkg::manager_for(&platform),
        ecosystem: Mutex::new(EcosystemState::default()),
    };
    (ctx, log)
}
