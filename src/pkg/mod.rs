//! Package-manager adapters for the supported ecosystems.
mod apt;
mod homebrew;

pub use apt::Apt;
pub use homebrew::Homebrew;

use anyhow::Result;
use serde::Deserialize;
use std::fmt;

use crate::error::InstallError;
use crate::exec::Executor;
use crate::logging::Log;
use crate::platform::{OsFamily, Platform};

/// A package manager together with its package namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ecosystem {
    /// Homebrew (macOS).
    Homebrew,
    /// APT (Debian/Ubuntu family).
    Apt,
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Homebrew => write!(f, "homebrew"),
            Self::Apt => write!(f, "apt"),
        }
    }
}

/// Per-run ecosystem bookkeeping, owned by the orchestrator.
///
/// Passed explicitly into [`PackageManager::install`] rather than living in
/// a process-wide global, so that once-per-run behaviour (index refresh,
/// bootstrap) is visible in signatures and testable.
#[derive(Debug, Clone, Copy, Default)]
pub struct EcosystemState {
    /// `None` until `ensure_present` has been attempted; then whether the
    /// ecosystem is usable for this run.
    pub ensured: Option<bool>,
    /// Whether the package index has been refreshed this run.
    pub index_refreshed: bool,
}

/// Polymorphic interface over the supported ecosystems.
pub trait PackageManager: Send + Sync + fmt::Debug {
    /// Which ecosystem this adapter drives.
    fn ecosystem(&self) -> Ecosystem;

    /// Make the package manager itself usable, bootstrapping it if the
    /// ecosystem supports that.
    ///
    /// Called at most once per run, before any per-tool install. Failure is
    /// not fatal to the run: the orchestrator logs it and continues with
    /// ecosystem strategies inapplicable.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager is absent and cannot be bootstrapped.
    fn ensure_present(
        &self,
        executor: &dyn Executor,
        log: &dyn Log,
        platform: &Platform,
    ) -> Result<()>;

    /// Install a package by name, non-interactively.
    ///
    /// # Errors
    ///
    /// A non-zero exit from the manager is surfaced as [`InstallError`],
    /// never an unrecoverable abort, so the orchestrator can continue with
    /// the next strategy or tool.
    fn install(
        &self,
        executor: &dyn Executor,
        log: &dyn Log,
        package: &str,
        state: &mut EcosystemState,
    ) -> Result<(), InstallError>;
}

/// Select the adapter for the platform, or `None` on [`OsFamily::Other`].
#[must_use]
pub fn manager_for(platform: &Platform) -> Option<Box<dyn PackageManager>> {
    match platform.family {
        OsFamily::MacOs => Some(Box::new(Homebrew)),
        OsFamily::LinuxApt => Some(Box::new(Apt)),
        OsFamily::Other => None,
    }
}
