//! Callback system for training events
//!
//! Provides hooks for training loop events:
//! - `on_train_begin` / `on_train_end`
//! - `on_epoch_end`
//! - `on_step_end`

mod early_stopping;
mod guard;
mod manager;
mod scheduler;
mod traits;

pub use early_stopping::EarlyStopping;
pub use guard::NonFiniteGuard;
pub use manager::CallbackManager;
pub use scheduler::ReduceLrOnPlateau;
pub use traits::{CallbackAction, CallbackContext, TrainerCallback};
