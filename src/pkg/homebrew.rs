//! Homebrew adapter: one-time bootstrap plus `brew install`.
use anyhow::{Result, bail};

use super::{Ecosystem, EcosystemState, PackageManager};
use crate::error::InstallError;
use crate::exec::Executor;
use crate::logging::Log;
use crate::platform::Platform;

/// URL of the official Homebrew install script.
const INSTALL_SCRIPT_URL: &str =
    "https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh";

/// The Homebrew ecosystem adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Homebrew;

impl Homebrew {
    /// Install prefix used by the bootstrap script for this platform.
    ///
    /// Apple silicon installs under `/opt/homebrew`; everything else uses
    /// `/usr/local`.
    #[must_use]
    pub fn prefix(platform: &Platform) -> &'static str {
        if platform.is_macos() && platform.arch == "aarch64" {
            "/opt/homebrew"
        } else {
            "/usr/local"
        }
    }

}

impl PackageManager for Homebrew {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Homebrew
    }

    fn ensure_present(
        &self,
        executor: &dyn Executor,
        log: &dyn Log,
        platform: &Platform,
    ) -> Result<()> {
        if executor.which("brew") {
            log.debug("brew already on PATH");
            return Ok(());
        }

        log.info("bootstrapping Homebrew");
        let script = format!("curl -fsSL {INSTALL_SCRIPT_URL} | /bin/bash");
        let result = executor.run_unchecked_with_env("/bin/bash", &["-c", &script], &[(
            "NONINTERACTIVE",
            "1",
        )])?;
        if !result.success {
            bail!("Homebrew bootstrap failed ({})", result.exit_details());
        }

        let bin = format!("{}/bin", Self::prefix(platform));
        log.debug(&format!("adding {bin} to PATH for this run"));
        crate::exec::prepend_path(&bin);
        Ok(())
    }

    fn install(
        &self,
        executor: &dyn Executor,
        log: &dyn Log,
        package: &str,
        _state: &mut EcosystemState,
    ) -> Result<(), InstallError> {
        log.debug(&format!("brew install {package}"));
        let result = executor
            .run_unchecked("brew", &["install", package])
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
