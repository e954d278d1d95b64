//! Fitting loop for the virtual twin

use super::callback::{
    CallbackAction, CallbackContext, CallbackManager, EarlyStopping, NonFiniteGuard, ReduceLrOnPlateau,
};
use super::checkpoint::{clear_manifest, write_checkpoint, write_manifest, ReadyManifest};
use super::config::TrainConfig;
use super::loss::LossFn;
use crate::data::Sample;
use crate::error::{Error, Result};
use crate::model::{CheckpointFile, TwinWeights, VirtualTwin};
use crate::optim::{clip_grad_norm, Adam, Optimizer};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Result of a training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainResult {
    /// Epochs completed
    pub epochs_run: usize,
    /// Mean training loss of the last epoch
    pub final_loss: f32,
    /// Best validation loss and the epoch it was reached at
    pub best_val_loss: Option<f32>,
    pub best_epoch: Option<usize>,
    /// Whether a callback stopped training before `epochs`
    pub stopped_early: bool,
    /// Total training time in seconds
    pub elapsed_secs: f64,
}

/// Orchestrates epochs, validation, callbacks and checkpointing
///
/// Every epoch with finite losses overwrites the checkpoint so partial progress
/// is visible through its modification time. A non-finite loss aborts with
/// [`Error::TrainingDiverged`] before that epoch is written.
pub struct Trainer {
    twin: VirtualTwin,
    optimizer: Box<dyn Optimizer>,
    loss_fn: Box<dyn LossFn>,
    callbacks: CallbackManager,
    config: TrainConfig,
    checkpoint: Option<PathBuf>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Trainer {
    /// Trainer with Adam and the default callbacks derived from `config`
    pub fn new(twin: VirtualTwin, config: TrainConfig) -> Self {
        let mut callbacks = CallbackManager::new();
        callbacks.add(NonFiniteGuard);
        if config.early_stopping.enabled {
            let es = &config.early_stopping;
            callbacks.add(EarlyStopping::new(es.patience, es.min_delta).start_from_epoch(es.start_from_epoch));
        }
        if config.plateau.enabled {
            let p = &config.plateau;
            callbacks.add(ReduceLrOnPlateau::new(p.factor, p.patience, p.min_delta));
        }
        Self {
            twin,
            optimizer: Box::new(Adam::default_params(config.lr)),
            loss_fn: config.loss.build(),
            callbacks,
            config,
            checkpoint: None,
            cancel: None,
        }
    }

    /// Persist weights to this file after every epoch
    pub fn with_checkpoint(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint = Some(path.into());
        self
    }

    /// Abort with [`Error::Cancelled`] once the flag is raised
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Get current learning rate
    pub fn lr(&self) -> f32 {
        self.optimizer.lr()
    }

    pub fn twin(&self) -> &VirtualTwin {
        &self.twin
    }

    pub fn into_twin(self) -> VirtualTwin {
        self.twin
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|f| f.load(Ordering::Relaxed))
    }

    fn context(&self, epoch: usize, step: usize, steps: usize, loss: f32, val_loss: Option<f32>, start: Instant) -> CallbackContext {
        CallbackContext {
            epoch,
            max_epochs: self.config.epochs,
            step,
            steps_per_epoch: steps,
            loss,
            lr: self.optimizer.lr(),
            val_loss,
            elapsed_secs: start.elapsed().as_secs_f64(),
        }
    }

    /// One optimisation step on a window; returns the window loss
    fn train_step(&mut self, sample: &Sample) -> Result<f32> {
        let pass = self.twin.forward(&sample.features)?;
        let (loss, grad_output) = self.loss_fn.forward(&pass.output, &sample.labels);
        if !loss.is_finite() {
            return Ok(loss);
        }
        let mut grads = self.twin.backward(&pass, &grad_output)?;
        if let Some(max_norm) = self.config.max_grad_norm {
            clip_grad_norm(&mut grads.buffers_mut(), max_norm);
        }
        self.optimizer.step(&mut self.twin.weights_mut().buffers_mut(), &grads.buffers());
        Ok(loss)
    }

    /// Mean loss over a split without updating weights
    pub fn evaluate(&self, samples: &[Sample]) -> Result<f32> {
        let mut total = 0.0f32;
        for sample in samples {
            let pred = self.twin.predict(&sample.features)?;
            total += self.loss_fn.forward(&pred, &sample.labels).0;
        }
        Ok(total / samples.len().max(1) as f32)
    }

    fn save_epoch(&self, epoch: usize) -> Result<()> {
        if let Some(path) = &self.checkpoint {
            let file = CheckpointFile { target: self.twin.target(), epoch, weights: self.twin.weights().clone() };
            write_checkpoint(path, &file)?;
        }
        Ok(())
    }

    /// Fit on the training windows, validating after every epoch
    ///
    /// A manifest already next to the checkpoint belongs to an earlier run and
    /// is removed before the first epoch.
    pub fn fit(&mut self, training: &[Sample], validation: &[Sample]) -> Result<TrainResult> {
        self.config.validate()?;
        if let Some(path) = &self.checkpoint {
            clear_manifest(path)?;
        }
        let start = Instant::now();
        let steps = training.len();
        let mut stopped_early = false;
        let mut final_loss = f32::NAN;
        let mut epochs_run = 0;
        let mut best: Option<(f32, usize, TwinWeights)> = None;

        let ctx = self.context(0, 0, steps, 0.0, None, start);
        if self.callbacks.on_train_begin(&ctx) == CallbackAction::Stop {
            stopped_early = true;
        }

        for epoch in 0..self.config.epochs {
            if stopped_early {
                break;
            }
            let mut total = 0.0f32;
            for (step, sample) in training.iter().enumerate() {
                if self.cancelled() {
                    return Err(Error::Cancelled);
                }
                let loss = self.train_step(sample)?;
                total += loss;
                let ctx = self.context(epoch, step, steps, loss, None, start);
                match self.callbacks.on_step_end(&ctx) {
                    CallbackAction::Diverged => return Err(Error::TrainingDiverged { epoch, loss }),
                    CallbackAction::SetLr(lr) => self.optimizer.set_lr(lr),
                    CallbackAction::Stop | CallbackAction::Continue => {}
                }
            }
            let train_loss = total / steps.max(1) as f32;
            let val_loss = if validation.is_empty() { None } else { Some(self.evaluate(validation)?) };
            final_loss = train_loss;

            let ctx = self.context(epoch, steps, steps, train_loss, val_loss, start);
            let action = self.callbacks.on_epoch_end(&ctx);
            if action == CallbackAction::Diverged {
                let loss = if train_loss.is_finite() { val_loss.unwrap_or(train_loss) } else { train_loss };
                return Err(Error::TrainingDiverged { epoch, loss });
            }

            epochs_run = epoch + 1;
            let monitored = ctx.monitored_loss();
            if best.as_ref().map_or(true, |(b, _, _)| monitored < *b) {
                best = Some((monitored, epoch, self.twin.weights().clone()));
            }
            self.save_epoch(epoch)?;
            tracing::debug!(epoch, train_loss, ?val_loss, lr = self.optimizer.lr(), "epoch finished");

            match action {
                CallbackAction::Stop => stopped_early = true,
                CallbackAction::SetLr(lr) => self.optimizer.set_lr(lr),
                CallbackAction::Continue | CallbackAction::Diverged => {}
            }
        }

        let (best_val_loss, best_epoch) = match best {
            Some((loss, epoch, weights)) => {
                if self.config.early_stopping.restore_best {
                    self.twin.set_weights(weights);
                    self.save_epoch(epoch)?;
                }
                (Some(loss), Some(epoch))
            }
            None => (None, None),
        };

        if let Some(path) = &self.checkpoint {
            let manifest = ReadyManifest {
                target: self.twin.target(),
                epochs_run,
                best_val_loss,
                finished_at: Utc::now(),
            };
            write_manifest(path, &manifest)?;
        }

        let ctx = self.context(epochs_run, steps, steps, final_loss, best_val_loss, start);
        self.callbacks.on_train_end(&ctx);

        Ok(TrainResult {
            epochs_run,
            final_loss,
            best_val_loss,
            best_epoch,
            stopped_early,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }
}
