//! Run command implementation

use super::describe;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{apply_overrides, load_spec, RunArgs, SyncSpec};
use crate::experiment::Experiment;

pub fn run_run(args: RunArgs, level: LogLevel) -> Result<(), String> {
    let mut spec = match &args.config {
        Some(path) => load_spec(path).map_err(describe)?,
        None => SyncSpec::default(),
    };
    apply_overrides(&mut spec, &args);

    let mut experiment = Experiment::new(spec).map_err(describe)?;
    if let Some(path) = &args.config {
        experiment = experiment.with_config_file(path);
    }
    let spec = experiment.spec();

    log(
        level,
        LogLevel::Normal,
        &format!(
            "Gemelo: {} / {} with sync {}, {} realization(s)",
            spec.topology.map(|t| t.as_str()).unwrap_or("?"),
            spec.target,
            if spec.sync.enabled { "on" } else { "off" },
            spec.realizations
        ),
    );
    for (version, dir) in experiment.ladder().entries().iter().enumerate() {
        log(level, LogLevel::Verbose, &format!("  v{version}: {}", dir.display()));
    }
    log(level, LogLevel::Verbose, &format!("  Checkpoints: {}", experiment.layout().root().display()));

    if args.dry_run {
        log(level, LogLevel::Normal, "Dry run - experiment validated successfully");
        return Ok(());
    }

    let outcomes = experiment.run().map_err(describe)?;
    for outcome in outcomes {
        let stats = &outcome.report.stats;
        log(
            level,
            LogLevel::Normal,
            &format!(
                "  r{}: {} windows, {} drift(s), {} retrain(s), {} swap(s) -> {}",
                outcome.realization,
                stats.windows,
                stats.drifts,
                stats.spawns,
                stats.swaps,
                outcome.results.display()
            ),
        );
    }
    Ok(())
}
