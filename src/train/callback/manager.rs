//! Callback manager for dispatching events to multiple callbacks

use super::traits::{CallbackAction, CallbackContext, TrainerCallback};

/// Manages multiple callbacks and dispatches events
///
/// When callbacks disagree, `Diverged` wins over `Stop`, which wins over
/// `SetLr`; among learning-rate requests the last one registered wins.
#[derive(Default)]
pub struct CallbackManager {
    callbacks: Vec<Box<dyn TrainerCallback>>,
}

fn merge(current: CallbackAction, next: CallbackAction) -> CallbackAction {
    use CallbackAction::{Continue, Diverged, SetLr, Stop};
    match (current, next) {
        (Diverged, _) | (_, Diverged) => Diverged,
        (Stop, _) | (_, Stop) => Stop,
        (_, SetLr(lr)) => SetLr(lr),
        (current, Continue) => current,
    }
}

impl CallbackManager {
    /// Create new callback manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a callback
    pub fn add<C: TrainerCallback + 'static>(&mut self, callback: C) {
        self.callbacks.push(Box::new(callback));
    }

    /// Check if no callbacks are registered
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Get number of callbacks
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Fire train begin event
    pub fn on_train_begin(&mut self, ctx: &CallbackContext) -> CallbackAction {
        self.callbacks.iter_mut().fold(CallbackAction::Continue, |acc, cb| merge(acc, cb.on_train_begin(ctx)))
    }

    /// Fire train end event
    pub fn on_train_end(&mut self, ctx: &CallbackContext) {
        for cb in &mut self.callbacks {
            cb.on_train_end(ctx);
        }
    }

    /// Fire epoch end event; every callback observes the epoch
    pub fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        self.callbacks.iter_mut().fold(CallbackAction::Continue, |acc, cb| merge(acc, cb.on_epoch_end(ctx)))
    }

    /// Fire step end event
    pub fn on_step_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        self.callbacks.iter_mut().fold(CallbackAction::Continue, |acc, cb| merge(acc, cb.on_step_end(ctx)))
    }

    /// Names of the registered callbacks
    pub fn names(&self) -> Vec<&'static str> {
        self.callbacks.iter().map(|cb| cb.name()).collect()
    }
}
