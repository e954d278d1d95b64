//! Virtual twin model
//!
//! The twin maps a traffic window to one predicted QoS value per flow. Its
//! inputs are normalized with statistics fitted on the training split, so the
//! normalization table is part of the model's contract even though it is not
//! part of the checkpoint.

mod features;
mod twin;
mod weights;

#[cfg(test)]
mod tests;

pub use features::{extract, INPUT_DIM};
pub use twin::{ForwardPass, VirtualTwin, DEFAULT_HIDDEN_DIM};
pub use weights::{CheckpointFile, TwinWeights};
