//! The `completion` subcommand.
use clap::CommandFactory as _;

use crate::cli::{Cli, CompletionOpts};

/// Generate shell completions on stdout.
pub fn run(opts: &CompletionOpts) {
    let mut cmd = Cli::command();
    clap_complete::generate(opts.shell, &mut cmd, "provision", &mut std::io::stdout());
}
