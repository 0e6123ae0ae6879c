//! Domain-specific error types for the provisioning engine.
//!
//! The taxonomy mirrors the run-abort policy: [`FatalError`] propagates to
//! the top level and terminates the process with a non-zero status, while
//! [`ToolError`] is caught at the per-step boundary, converted into a report
//! entry plus a warning, and the run continues. Command handlers at the CLI
//! boundary convert both to [`anyhow::Error`] via the standard `?` operator.

use thiserror::Error;

/// Errors that abort the entire run.
///
/// Everything downstream of a fatal step is meaningless without it: no
/// writable directory layout, no configuration tool, or no applied
/// configuration means provisioning did not happen.
#[derive(Error, Debug)]
pub enum FatalError {
    /// A standard directory could not be created.
    #[error("cannot create directory {path}: {source}")]
    Layout {
        /// Path that could not be created.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration-application tool itself could not be installed.
    #[error("failed to bootstrap the configuration tool: {reason}")]
    Bootstrap {
        /// Why every install strategy failed.
        reason: String,
    },

    /// Applying the configuration failed.
    ///
    /// The external tool's diagnostic output is preserved verbatim.
    #[error("configuration apply failed: {output}")]
    Apply {
        /// Diagnostic output from the external tool.
        output: String,
    },
}

/// Errors captured into the run report without aborting the run.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Every applicable install strategy for a tool failed.
    #[error("all install strategies for '{tool}' failed: {reasons}")]
    StrategiesExhausted {
        /// Logical tool name.
        tool: String,
        /// Per-strategy failure reasons, joined.
        reasons: String,
    },

    /// The login shell could not be changed.
    #[error("could not change the login shell: {reason}. Run `chsh -s {shell}` manually")]
    ShellChange {
        /// Why the change failed.
        reason: String,
        /// Path to the target shell, for the remediation hint.
        shell: String,
    },

    /// The shell-plugin lock step failed.
    #[error("plugin lock failed: {reason}")]
    PluginLock {
        /// Diagnostic from the plugin manager.
        reason: String,
    },
}

/// A single package-manager install that exited non-zero.
///
/// Surfaced as a value so the orchestrator can fall through to the next
/// strategy instead of aborting the run.
#[derive(Error, Debug)]
#[error("installing '{package}' via {ecosystem} failed ({details})")]
pub struct InstallError {
    /// Package name as passed to the manager.
    pub package: String,
    /// Ecosystem the install was attempted in.
    pub ecosystem: String,
    /// Exit details from the manager invocation.
    pub details: String,
}
