//! Top-level subcommand orchestration.
pub mod completion;
pub mod run;
pub mod status;
