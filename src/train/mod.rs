//! Training of the virtual twin
//!
//! - Losses (MAPE, MSE)
//! - Trainer with validation, callbacks and per-epoch checkpoints
//! - Checkpoint and `.ready` manifest files
//! - Training-duration log

pub mod callback;
mod checkpoint;
mod config;
mod duration;
mod evaluate;
mod loss;
mod trainer;


pub use callback::{
    CallbackAction, CallbackContext, CallbackManager, EarlyStopping, NonFiniteGuard, ReduceLrOnPlateau,
    TrainerCallback,
};
pub use checkpoint::{
    clear_manifest, manifest_path, read_checkpoint, read_manifest, weights_path, write_checkpoint, write_json_atomic,
    write_manifest, ReadyManifest,
};
pub use config::{EarlyStoppingConfig, PlateauConfig, TrainConfig};
pub use duration::DurationLog;
pub use evaluate::{train_and_evaluate, TrainOutputs};
pub use loss::{LossFn, LossKind, MapeLoss, MseLoss};
pub use trainer::{TrainResult, Trainer};
