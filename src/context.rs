//! Shared context for pipeline execution.
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;

use crate::config::Plan;
use crate::exec::Executor;
use crate::logging::Log;
use crate::pkg::{self, EcosystemState, PackageManager};
use crate::platform::Platform;

/// Everything a pipeline step needs: collaborators, run options, and the
/// orchestrator-local ecosystem state.
pub struct Context {
    /// The tool install plan for this run.
    pub plan: Plan,
    /// Detected platform information, computed once.
    pub platform: Arc<Platform>,
    /// Logger for output and step recording.
    pub log: Arc<dyn Log>,
    /// Command executor (real system calls, or scripted in tests).
    pub executor: Arc<dyn Executor>,
    /// Whether to preview changes without applying them.
    pub dry_run: bool,
    /// The operator's home directory.
    pub home: PathBuf,
    /// Package manager for this platform, if one exists.
    pub manager: Option<Box<dyn PackageManager>>,
    /// Once-per-run ecosystem bookkeeping (bootstrap outcome, index refresh).
    pub ecosystem: Mutex<EcosystemState>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("platform", &self.platform)
            .field("dry_run", &self.dry_run)
            .field("home", &self.home)
            .field("manager", &self.manager)
            .field("ecosystem", &self.ecosystem)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Create a context for pipeline execution.
    ///
    /// Selects the package manager for the platform and resolves the home
    /// directory from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the HOME environment variable is not set.
    pub fn new(
        plan: Plan,
        platform: Arc<Platform>,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
        dry_run: bool,
    ) -> Result<Self> {
        let home = std::env::var("HOME")
            .map_err(|_| anyhow::anyhow!("HOME environment variable is not set"))?;
        let manager = pkg::manager_for(&platform);

        Ok(Self {
            plan,
            platform,
            log,
            executor,
            dry_run,
            home: PathBuf::from(home),
            manager,
            ecosystem: Mutex::new(EcosystemState::default()),
        })
    }

    /// Acquire the ecosystem state lock.
    ///
    /// Recovers from a poisoned lock (which can only occur if a previous step
    /// panicked) by consuming the poison and returning the inner value.
    pub fn ecosystem_state(&self) -> MutexGuard<'_, EcosystemState> {
        self.ecosystem
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
