//! Reduce-on-plateau learning rate callback

use super::traits::{CallbackAction, CallbackContext, TrainerCallback};

/// Multiplies the learning rate by `factor` when the monitored loss has not
/// improved by more than `min_delta` for `patience` epochs
#[derive(Clone, Debug)]
pub struct ReduceLrOnPlateau {
    factor: f32,
    patience: usize,
    min_delta: f32,
    min_lr: f32,
    best_loss: f32,
    wait: usize,
}

impl ReduceLrOnPlateau {
    pub fn new(factor: f32, patience: usize, min_delta: f32) -> Self {
        Self { factor, patience, min_delta, min_lr: 0.0, best_loss: f32::INFINITY, wait: 0 }
    }

    /// Lower bound for the learning rate
    pub fn with_min_lr(mut self, min_lr: f32) -> Self {
        self.min_lr = min_lr;
        self
    }
}

impl TrainerCallback for ReduceLrOnPlateau {
    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        let loss = ctx.monitored_loss();
        if loss < self.best_loss - self.min_delta {
            self.best_loss = loss;
            self.wait = 0;
            return CallbackAction::Continue;
        }
        self.wait += 1;
        if self.wait < self.patience {
            return CallbackAction::Continue;
        }
        self.wait = 0;
        let new_lr = (ctx.lr * self.factor).max(self.min_lr);
        if new_lr < ctx.lr {
            tracing::debug!(epoch = ctx.epoch, lr = new_lr, "reducing learning rate");
            CallbackAction::SetLr(new_lr)
        } else {
            CallbackAction::Continue
        }
    }

    fn name(&self) -> &'static str {
        "ReduceLrOnPlateau"
    }
}
