//! Train command implementation
//!
//! This is what a retraining process runs. Its exit status reports whether
//! fitting finished.

use super::describe;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{apply_train_overrides, load_spec, TrainArgs};
use crate::model::VirtualTwin;
use crate::train::{train_and_evaluate, DurationLog, TrainConfig, TrainOutputs};

pub fn run_train(args: TrainArgs, level: LogLevel) -> Result<(), String> {
    let mut config = match &args.config {
        Some(path) => load_spec(path).map_err(describe)?.training,
        None => TrainConfig::default(),
    };
    apply_train_overrides(&mut config, &args);
    config.validate().map_err(describe)?;

    log(
        level,
        LogLevel::Normal,
        &format!("Gemelo: training {} twin on {}", args.target, args.dataset.display()),
    );
    log(
        level,
        LogLevel::Verbose,
        &format!("  Epochs: {}, lr: {}, loss: {:?}", config.epochs, config.lr, config.loss),
    );

    let outputs = TrainOutputs {
        checkpoint: Some(args.checkpoint.clone()),
        duration_log: args.duration_log.clone().map(DurationLog::new),
        cancel: None,
    };
    let target = args.target;
    let (_, result) = train_and_evaluate(
        &args.dataset,
        || VirtualTwin::untrained(target, config.hidden_dim, config.seed),
        &config,
        &outputs,
    )
    .map_err(describe)?;

    log(
        level,
        LogLevel::Normal,
        &format!(
            "Training complete: {} epoch(s) in {:.1}s -> {}",
            result.epochs_run,
            result.elapsed_secs,
            args.checkpoint.display()
        ),
    );
    Ok(())
}
