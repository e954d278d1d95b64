//! Non-finite loss guard

use super::traits::{CallbackAction, CallbackContext, TrainerCallback};

/// Terminates fitting as soon as a loss is not finite
#[derive(Clone, Copy, Debug, Default)]
pub struct NonFiniteGuard;

impl NonFiniteGuard {
    fn check(loss: f32) -> CallbackAction {
        if loss.is_finite() {
            CallbackAction::Continue
        } else {
            CallbackAction::Diverged
        }
    }
}

impl TrainerCallback for NonFiniteGuard {
    fn on_step_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        Self::check(ctx.loss)
    }

    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        match ctx.val_loss {
            Some(val) if !val.is_finite() => CallbackAction::Diverged,
            _ => Self::check(ctx.loss),
        }
    }

    fn name(&self) -> &'static str {
        "NonFiniteGuard"
    }
}
