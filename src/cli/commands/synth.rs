//! Synth command implementation

use super::describe;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::SynthArgs;
use crate::data::{SynthConfig, SyntheticLadder};

/// Generator settings with command-line overrides applied
pub(super) fn synth_config(args: &SynthArgs) -> SynthConfig {
    let mut config = SynthConfig::default();
    if let Some(windows) = args.testing_windows {
        config.testing_windows = windows;
    }
    if let Some(flows) = args.flows {
        config.flows = flows;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.delay_budget = args.delay_budget;
    config
}

pub fn run_synth(args: SynthArgs, level: LogLevel) -> Result<(), String> {
    let mut generator = SyntheticLadder::new(synth_config(&args), args.target).map_err(describe)?;
    let dirs = generator
        .write_ladder(&args.output, args.topology, &args.suffixes)
        .map_err(describe)?;

    log(
        level,
        LogLevel::Normal,
        &format!("Wrote {} synthetic dataset(s) for {}", dirs.len(), args.topology),
    );
    for dir in &dirs {
        log(level, LogLevel::Verbose, &format!("  {}", dir.display()));
    }
    Ok(())
}
