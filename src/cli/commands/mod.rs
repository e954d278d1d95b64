//! CLI command implementations

mod report;
mod run;
mod synth;
mod train;

#[cfg(test)]
mod tests;

use crate::cli::logging::init_tracing;
use crate::cli::LogLevel;
use crate::config::{Cli, Command};
use crate::error::Error;

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = LogLevel::from_flags(cli.quiet, cli.verbose);
    init_tracing(log_level);

    match cli.command {
        Command::Run(args) => run::run_run(args, log_level),
        Command::Train(args) => train::run_train(args, log_level),
        Command::Synth(args) => synth::run_synth(args, log_level),
        Command::Report(args) => report::run_report(args, log_level),
    }
}

/// User-facing message, separating operator mistakes from runtime faults
fn describe(e: Error) -> String {
    if e.is_config_error() {
        format!("Config error: {e}")
    } else {
        format!("Run error: {e}")
    }
}
