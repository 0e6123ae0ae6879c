//! Command-line argument definitions.
use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Top-level CLI entry point for the provisioning engine.
#[derive(Parser, Debug)]
#[command(
    name = "provision",
    about = "Workstation provisioning engine",
    version
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared across subcommands.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Override the built-in tool plan with a TOML file
    #[arg(long, global = true)]
    pub plan: Option<std::path::PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Provision the workstation: directories, tools, shell, configuration
    Run(RunOpts),
    /// Report which planned tools are already on PATH, without installing
    Status,
    /// Generate shell completions
    Completion(CompletionOpts),
    /// Print version information
    Version,
}

/// Options for the `run` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RunOpts {
    /// Skip steps whose name contains any of these keywords
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Run only steps whose name contains any of these keywords
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,
}

/// Options for the `completion` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CompletionOpts {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_run() {
        let cli = Cli::parse_from(["provision", "run"]);
        assert!(matches!(cli.command, Command::Run(_)));
    }

    #[test]
    fn parse_run_dry_run() {
        let cli = Cli::parse_from(["provision", "--dry-run", "run"]);
        assert!(cli.global.dry_run);
    }

    #[test]
    fn parse_run_dry_run_short() {
        let cli = Cli::parse_from(["provision", "-d", "run"]);
        assert!(cli.global.dry_run);
    }

    #[test]
    fn parse_run_skip_steps() {
        let cli = Cli::parse_from(["provision", "run", "--skip", "shell,plugins"]);
        let Command::Run(opts) = cli.command else {
            panic!("expected Run command");
        };
        assert_eq!(opts.skip, vec!["shell", "plugins"]);
    }

    #[test]
    fn parse_run_only_steps() {
        let cli = Cli::parse_from(["provision", "run", "--only", "tools"]);
        let Command::Run(opts) = cli.command else {
            panic!("expected Run command");
        };
        assert_eq!(opts.only, vec!["tools"]);
    }

    #[test]
    fn parse_plan_override() {
        let cli = Cli::parse_from(["provision", "--plan", "/tmp/plan.toml", "run"]);
        assert_eq!(
            cli.global.plan,
            Some(std::path::PathBuf::from("/tmp/plan.toml"))
        );
    }

    #[test]
    fn parse_status() {
        let cli = Cli::parse_from(["provision", "status"]);
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["provision", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::parse_from(["provision", "-v", "run"]);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_completion() {
        let cli = Cli::parse_from(["provision", "completion", "zsh"]);
        assert!(matches!(cli.command, Command::Completion(_)));
    }
}
