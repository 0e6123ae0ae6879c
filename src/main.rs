//! Command-line entry point for the `provision` workstation provisioning
//! engine: parses arguments, initializes logging, and dispatches subcommands.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use provision_cli::{cli, commands, logging};

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose);
    let log = Arc::new(logging::Logger::new());

    match args.command {
        cli::Command::Run(opts) => commands::run::run(&args.global, &opts, &log),
        cli::Command::Status => commands::status::run(&args.global, &log),
        cli::Command::Completion(opts) => {
            commands::completion::run(&opts);
            Ok(())
        }
        cli::Command::Version => {
            let version = option_env!("PROVISION_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            println!("provision {version}");
            Ok(())
        }
    }
}
