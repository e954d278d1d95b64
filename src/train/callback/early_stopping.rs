//! Early stopping callback to halt training when loss plateaus

use super::traits::{CallbackAction, CallbackContext, TrainerCallback};

/// Early stopping callback to halt training when loss plateaus
///
/// Monitors the validation loss (training loss when no validation is
/// available) and stops training if no improvement larger than `min_delta`
/// is seen for `patience` epochs. Epochs before `start_from_epoch` are not
/// monitored.
#[derive(Clone, Debug)]
pub struct EarlyStopping {
    /// Number of epochs to wait for improvement
    patience: usize,
    /// Minimum improvement to reset patience
    min_delta: f32,
    /// First epoch that is monitored
    start_from_epoch: usize,
    /// Best loss seen so far
    best_loss: f32,
    /// Epoch at which `best_loss` was seen
    best_epoch: Option<usize>,
    /// Epochs without improvement
    pub(crate) epochs_without_improvement: usize,
}

impl EarlyStopping {
    /// Create new early stopping callback
    pub fn new(patience: usize, min_delta: f32) -> Self {
        Self {
            patience,
            min_delta,
            start_from_epoch: 0,
            best_loss: f32::INFINITY,
            best_epoch: None,
            epochs_without_improvement: 0,
        }
    }

    /// Ignore the first `epoch` epochs (warm-up)
    pub fn start_from_epoch(mut self, epoch: usize) -> Self {
        self.start_from_epoch = epoch;
        self
    }

    /// Best monitored loss so far
    pub fn best_loss(&self) -> f32 {
        self.best_loss
    }

    /// Epoch of the best monitored loss
    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }

    /// Reset internal state
    pub fn reset(&mut self) {
        self.best_loss = f32::INFINITY;
        self.best_epoch = None;
        self.epochs_without_improvement = 0;
    }

    /// Check if loss improved
    fn check_improvement(&mut self, loss: f32, epoch: usize) -> bool {
        if loss < self.best_loss - self.min_delta {
            self.best_loss = loss;
            self.best_epoch = Some(epoch);
            self.epochs_without_improvement = 0;
            true
        } else {
            self.epochs_without_improvement += 1;
            false
        }
    }
}

impl TrainerCallback for EarlyStopping {
    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        if ctx.epoch < self.start_from_epoch {
            return CallbackAction::Continue;
        }
        self.check_improvement(ctx.monitored_loss(), ctx.epoch);

        if self.epochs_without_improvement >= self.patience {
            tracing::info!(
                patience = self.patience,
                best_loss = self.best_loss,
                "early stopping: no improvement"
            );
            CallbackAction::Stop
        } else {
            CallbackAction::Continue
        }
    }

    fn name(&self) -> &'static str {
        "EarlyStopping"
    }
}
