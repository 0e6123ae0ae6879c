//! Workstation provisioning engine.
//!
//! Provisions a fresh workstation for a single operator: detects the host
//! platform, installs a baseline toolchain through whichever package
//! ecosystem is available, configures the default interactive shell,
//! establishes the standard directory layout, and hands off to chezmoi to
//! materialize the operator's configuration from a local working copy or a
//! remote repository.
//!
//! The public API is organised in layers:
//!
//! - **[`config`]** — the declarative tool install plan (built-in or TOML)
//! - **[`pkg`]** — package-manager adapters (Homebrew, APT)
//! - **[`installer`]** — the orchestration core: idempotency probe, ordered
//!   strategy fallback, failure tolerance
//! - **[`steps`]** — the fixed provisioning pipeline wired to the core
//! - **[`commands`]** — top-level subcommand orchestration (`run`, `status`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod exec;
pub mod installer;
pub mod logging;
pub mod pkg;
pub mod platform;
pub mod steps;
