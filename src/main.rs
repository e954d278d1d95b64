//! Gemelo CLI
//!
//! # Usage
//!
//! ```bash
//! # Baseline run, drift logged only
//! gemelo run -t germany -d ./data -r 3
//!
//! # Synchronized run
//! gemelo run -t germany -d ./data -r 3 --sync
//!
//! # Smoke test on synthetic data
//! gemelo synth -o ./data -t germany
//! gemelo run --config experiment.yaml
//! ```

use clap::Parser;
use gemelo::cli::{run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
