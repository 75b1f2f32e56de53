//! Unspool CLI - Command-line utility for safe archive extraction.

mod cli;
mod commands;
mod error;
mod interrupt;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    let formatter = output::create_formatter(cli.json, cli.verbose > 0, cli.quiet);

    if let Err(e) = logging::init(cli.verbose, cli.quiet) {
        formatter.format_error("logging", &e);
        return ExitCode::FAILURE;
    }

    let interrupted = match interrupt::install() {
        Ok(flag) => flag,
        Err(e) => {
            formatter.format_error("signals", &e);
            return ExitCode::FAILURE;
        }
    };

    let (operation, result) = match &cli.command {
        cli::Commands::Extract(args) => (
            "extract",
            commands::extract::execute(args, &*formatter, &*interrupted),
        ),
        cli::Commands::Detect(args) => ("detect", commands::detect::execute(args, &*formatter)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            formatter.format_error(operation, &e);
            if interrupt::is_interrupt(&e) {
                ExitCode::from(interrupt::INTERRUPTED_EXIT)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
