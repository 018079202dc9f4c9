mod cli;
mod commands;
mod logging;
mod report;

use std::process::ExitCode;

use clap::Parser;

use crate::cli::Cli;
use crate::report::report_error;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.global);
    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}
