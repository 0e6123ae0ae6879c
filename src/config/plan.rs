//! The tool install plan: which tools to provision and how.
//!
//! A plan is a declarative table mapping a logical tool name to one or more
//! install strategies, ordered by preference. The built-in plan covers the
//! standard workstation tool set; `--plan <file>` replaces it wholesale with
//! a TOML file of the same shape.
use anyhow::{Context as _, Result, bail};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::pkg::Ecosystem;

/// One concrete method of installing a tool.
///
/// Each strategy is self-contained: it either fully installs the tool or
/// fails cleanly without partial, unrecoverable host mutation.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InstallStrategy {
    /// Install through an ecosystem package manager.
    Package {
        /// Ecosystem the package lives in.
        ecosystem: Ecosystem,
        /// Package name within that ecosystem (may differ from the probe).
        package: String,
    },
    /// Fetch a remote installer script and pipe it to `sh`.
    Script {
        /// URL of the installer script.
        url: String,
        /// Arguments passed to the script after `--`.
        #[serde(default)]
        args: Vec<String>,
    },
    /// Build from source via a language toolchain (e.g. `cargo install`).
    Source {
        /// Toolchain binary that must be present (e.g. `cargo`).
        toolchain: String,
        /// Package name passed to the toolchain's install verb.
        package: String,
    },
}

impl InstallStrategy {
    /// The kind tag for this strategy, used in outcome reporting.
    #[must_use]
    pub const fn kind(&self) -> StrategyKind {
        match self {
            Self::Package { .. } => StrategyKind::Package,
            Self::Script { .. } => StrategyKind::Script,
            Self::Source { .. } => StrategyKind::Source,
        }
    }
}

/// Kind tag of an [`InstallStrategy`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Ecosystem package manager.
    Package,
    /// Remote installer script.
    Script,
    /// Source build via a toolchain.
    Source,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package => write!(f, "package"),
            Self::Script => write!(f, "script"),
            Self::Source => write!(f, "source"),
        }
    }
}

/// A tool to provision.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolSpec {
    /// Logical tool name, used in logs and the run report.
    pub name: String,
    /// Binary name used for the idempotency probe. May differ from the
    /// package name (e.g. probe `rg` for package `ripgrep`).
    pub probe: String,
    /// Install strategies in order of preference.
    pub strategies: Vec<InstallStrategy>,
}

/// The full, ordered tool install plan.
///
/// Order is significant: tools whose install depends on an earlier one (a
/// language-version manager before anything it provisions) must be declared
/// after their prerequisite.
#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    /// Tools in install order. The first entry is the configuration tool
    /// itself, bootstrapped before the rest of the pipeline runs.
    pub tools: Vec<ToolSpec>,
}

/// Name of the configuration-application tool; its bootstrap is the one
/// fatal install of the run.
pub const CONFIG_TOOL: &str = "chezmoi";

impl Plan {
    /// The built-in workstation tool plan.
    #[must_use]
    pub fn builtin() -> Self {
        let brew = |package: &str| InstallStrategy::Package {
            ecosystem: Ecosystem::Homebrew,
            package: package.to_string(),
        };
        let apt = |package: &str| InstallStrategy::Package {
            ecosystem: Ecosystem::Apt,
            package: package.to_string(),
        };
        let tool = |name: &str, probe: &str, strategies: Vec<InstallStrategy>| ToolSpec {
            name: name.to_string(),
            probe: probe.to_string(),
            strategies,
        };

        Self {
            tools: vec![
                // The configuration tool comes first and must succeed.
                // chezmoi is not packaged in the Debian stable archive, so
                // apt hosts fall through to the official installer script.
                tool(CONFIG_TOOL, "chezmoi", vec![
                    brew("chezmoi"),
                    InstallStrategy::Script {
                        url: "https://get.chezmoi.io".to_string(),
                        args: vec!["-b".to_string(), "$HOME/.local/bin".to_string()],
                    },
                ]),
                tool("git", "git", vec![brew("git"), apt("git")]),
                tool("zsh", "zsh", vec![brew("zsh"), apt("zsh")]),
                tool("curl", "curl", vec![brew("curl"), apt("curl")]),
                tool("fzf", "fzf", vec![brew("fzf"), apt("fzf")]),
                tool("ripgrep", "rg", vec![brew("ripgrep"), apt("ripgrep")]),
                // Debian packages fd under a different name.
                tool("fd", "fd", vec![brew("fd"), apt("fd-find")]),
                tool("starship", "starship", vec![
                    brew("starship"),
                    InstallStrategy::Script {
                        url: "https://starship.rs/install.sh".to_string(),
                        args: vec!["--yes".to_string()],
                    },
                ]),
                // mise manages language runtimes; it must exist before any
                // tool it would provision, so it precedes sheldon.
                tool("mise", "mise", vec![
                    brew("mise"),
                    InstallStrategy::Script {
                        url: "https://mise.run".to_string(),
                        args: vec![],
                    },
                ]),
                tool("sheldon", "sheldon", vec![
                    brew("sheldon"),
                    InstallStrategy::Source {
                        toolchain: "cargo".to_string(),
                        package: "sheldon".to_string(),
                    },
                ]),
            ],
        }
    }

    /// Load the plan from `path`, or the built-in plan when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the plan
    /// violates an invariant (see [`Plan::validate`]).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let plan = match path {
            None => Self::builtin(),
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read plan file: {}", path.display()))?;
                toml::from_str(&content)
                    .with_context(|| format!("failed to parse plan file: {}", path.display()))?
            }
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Check plan invariants: at least one tool, non-empty strategy lists,
    /// unique tool names.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violated invariant.
    pub fn validate(&self) -> Result<()> {
        if self.tools.is_empty() {
            bail!("plan contains no tools");
        }
        let mut seen = std::collections::HashSet::new();
        for tool in &self.tools {
            if tool.strategies.is_empty() {
                bail!("tool '{}' has no install strategies", tool.name);
            }
            if !seen.insert(tool.name.as_str()) {
                bail!("duplicate tool name '{}' in plan", tool.name);
            }
        }
        Ok(())
    }

    /// The spec for the configuration tool, if the plan declares one.
    #[must_use]
    pub fn config_tool(&self) -> Option<&ToolSpec> {
        self.tools.iter().find(|t| t.name == CONFIG_TOOL)
    }

    /// All tools except the configuration tool, in declared order.
    #[must_use]
    pub fn remaining_tools(&self) -> Vec<&ToolSpec> {
        self.tools.iter().filter(|t| t.name != CONFIG_TOOL).collect()
    }
}
