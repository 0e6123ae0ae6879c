//! APT adapter: once-per-run index refresh plus `apt-get install`.
use anyhow::{Result, bail};

use super::{Ecosystem, EcosystemState, PackageManager};
use crate::error::InstallError;
use crate::exec::Executor;
use crate::logging::Log;
use crate::platform::Platform;

/// The APT ecosystem adapter.
///
/// apt-get is assumed pre-installed on the hosts that report the
/// [`LinuxApt`](crate::platform::OsFamily::LinuxApt) family; there is no
/// bootstrap path.
#[derive(Debug, Clone, Copy, Default)]
pub struct Apt;

impl Apt {
    /// Refresh the package index if it has not been refreshed this run.
    ///
    /// A failed refresh is downgraded to a warning: the subsequent install
    /// carries the real error if the index was genuinely required. The flag
    /// is set either way so the refresh runs at most once per run.
    fn refresh_index_once(
        executor: &dyn Executor,
        log: &dyn Log,
        state: &mut EcosystemState,
    ) {
        if state.index_refreshed {
            return;
        }
        state.index_refreshed = true;
        log.info("refreshing apt package index");
        match executor.run_unchecked("sudo", &["apt-get", "update", "-qq"]) {
            Ok(result) if result.success => {}
            Ok(result) => log.warn(&format!(
                "apt-get update failed ({}); continuing with stale index",
                result.exit_details()
            )),
            Err(e) => log.warn(&format!("apt-get update could not run: {e:#}")),
        }
    }
}

impl PackageManager for Apt {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Apt
    }

    fn ensure_present(
        &self,
        executor: &dyn Executor,
        log: &dyn Log,
        _platform: &Platform,
    ) -> Result<()> {
        if executor.which("apt-get") {
            log.debug("apt-get already on PATH");
            return Ok(());
        }
        bail!("apt-get not found on PATH");
    }

    fn install(
        &self,
        executor: &dyn Executor,
        log: &dyn Log,
        package: &str,
        state: &mut EcosystemState,
    ) -> Result<(), InstallError> {
        Self::refresh_index_once(executor, log, state);

        log.debug(&format!("apt-get install {package}"));
        let result = executor
            .run_unchecked("sudo", &[
                "DEBIAN_FRONTEND=noninteractive",
                "apt-get",
                "install",
                "-y",
                package,
            ])
            .map_err(|e| InstallError {
                package: package.to_string(),
                ecosystem: self.ecosystem().to_string(),
                details: format!("{e:#}"),
            })?;
        if result.success {
            Ok(())
        } else {
            Err(InstallError {
                package: package.to_string(),
                ecosystem: self.ecosystem().to_string(),
                details: result.exit_details(),
            })
        }
    }
}
