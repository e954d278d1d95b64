//! Gemelo: a network digital twin kept in sync with the network it mirrors
//!
//! A learned per-flow delay/jitter model (the virtual twin) evaluates a stream
//! of traffic windows. A concept-drift detector watches the per-flow traffic;
//! when it fires, a retraining job is started on the next entry of the
//! training ladder and, once its checkpoint is fresh, the new model is swapped
//! in without stopping the stream.
//!
//! # Modules
//!
//! - [`data`]: windows, dataset splits, ladders, normalization, synthetic data
//! - [`drift`]: KSWIN and error-threshold detectors
//! - [`model`]: the virtual twin
//! - [`optim`]: Adam and gradient clipping
//! - [`train`]: trainer, callbacks, checkpoints, duration log
//! - [`sync`]: the synchronization loop and its collaborators
//! - [`experiment`]: per-realization orchestration
//! - [`config`] / [`cli`]: command line and experiment files

pub mod cli;
pub mod config;
pub mod data;
pub mod drift;
pub mod error;
pub mod experiment;
pub mod model;
pub mod optim;
pub mod sync;
pub mod train;

pub use error::{Error, Result};
