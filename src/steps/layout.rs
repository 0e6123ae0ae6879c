//! Standard directory layout, created before anything writes into it.
use anyhow::Result;
use std::path::PathBuf;

use super::{Step, StepResult};
use crate::context::Context;
use crate::error::FatalError;

/// The standard directory set: env override name plus default relative to
/// the home directory.
const STANDARD_DIRS: [(&str, &str); 4] = [
    ("XDG_CONFIG_HOME", ".config"),
    ("XDG_CACHE_HOME", ".cache"),
    ("XDG_DATA_HOME", ".local/share"),
    ("XDG_STATE_HOME", ".local/state"),
];

/// Relative path of the user binary directory, always created and put on
/// PATH so script-installed tools resolve within the same run.
const LOCAL_BIN: &str = ".local/bin";

/// Resolve the full directory set for `home`, honouring env overrides.
///
/// Each standard directory is individually overridable via its environment
/// variable; an unset or empty variable falls back to the documented default
/// under `home`.
#[must_use]
pub fn standard_directories(home: &std::path::Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = STANDARD_DIRS
        .iter()
        .map(|(var, default)| match std::env::var(var) {
            Ok(value) if !value.is_empty() => PathBuf::from(value),
            _ => home.join(default),
        })
        .collect();
    dirs.push(home.join(LOCAL_BIN));
    dirs
}

/// Create the standard directory set.
///
/// Idempotent: existing directories are fine; a permissions or filesystem
/// error is fatal because nothing downstream can function without a writable
/// layout.
#[derive(Debug, Clone, Copy)]
pub struct EnsureDirectories;

impl Step for EnsureDirectories {
    fn name(&self) -> &'static str {
        "Ensure directory layout"
    }

    fn fatal(&self) -> bool {
        true
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let dirs = standard_directories(&ctx.home);

        if ctx.dry_run {
            for dir in &dirs {
                ctx.log.dry_run(&format!("create {}", dir.display()));
            }
            return Ok(StepResult::DryRun);
        }

        for dir in &dirs {
            std::fs::create_dir_all(dir).map_err(|source| FatalError::Layout {
                path: dir.display().to_string(),
                source,
            })?;
            ctx.log.debug(&format!("ensured {}", dir.display()));
        }

        let local_bin = ctx.home.join(LOCAL_BIN);
        crate::exec::prepend_path(&local_bin.display().to_string());

        Ok(StepResult::Ok)
    }
}
