//! Declarative configuration for the provisioning run.
pub mod plan;

pub use plan::{InstallStrategy, Plan, StrategyKind, ToolSpec};
