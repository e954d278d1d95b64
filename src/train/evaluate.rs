//! End-to-end training of one ladder entry

use super::config::TrainConfig;
use super::duration::DurationLog;
use super::trainer::{TrainResult, Trainer};
use crate::data::{load_split, NormalizationTable, Split};
use crate::error::Result;
use crate::model::VirtualTwin;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Where a training run writes its outputs
#[derive(Debug, Clone, Default)]
pub struct TrainOutputs {
    /// Weights file rewritten after every epoch
    pub checkpoint: Option<PathBuf>,
    /// Duration log the elapsed time is appended to
    pub duration_log: Option<DurationLog>,
    /// Cooperative cancellation flag
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Train a fresh twin on `{dataset_dir}/training`, validating on `validation`
///
/// The configuration is validated before any file is touched. The
/// normalization table is fitted on the training split and installed on the
/// model before fitting.
pub fn train_and_evaluate<F>(
    dataset_dir: &Path,
    model_factory: F,
    config: &TrainConfig,
    outputs: &TrainOutputs,
) -> Result<(VirtualTwin, TrainResult)>
where
    F: FnOnce() -> VirtualTwin,
{
    config.validate()?;

    let training = load_split(dataset_dir, Split::Training)?;
    let validation = load_split(dataset_dir, Split::Validation)?;
    let table = NormalizationTable::fit(&training)?;

    let mut twin = model_factory();
    twin.set_normalization(table);

    let mut trainer = Trainer::new(twin, config.clone());
    if let Some(path) = &outputs.checkpoint {
        trainer = trainer.with_checkpoint(path.clone());
    }
    if let Some(flag) = &outputs.cancel {
        trainer = trainer.with_cancel_flag(Arc::clone(flag));
    }

    tracing::info!(
        dataset = %dataset_dir.display(),
        windows = training.len(),
        epochs = config.epochs,
        "training twin"
    );
    let result = trainer.fit(&training, &validation)?;
    tracing::info!(
        epochs_run = result.epochs_run,
        best_val_loss = ?result.best_val_loss,
        elapsed_secs = result.elapsed_secs,
        "training finished"
    );

    if let Some(log) = &outputs.duration_log {
        log.append(result.elapsed_secs)?;
    }
    Ok((trainer.into_twin(), result))
}
