use std::process::ExitCode;

use clap::Parser;
use sketchpad::{cli, logger};

fn main() -> ExitCode {
    let args = cli::CliArgs::parse();

    // Session log (overwrites the previous run's log)
    logger::init_with_default(if args.verbose { "debug" } else { "info" });

    cli::run(args)
}
