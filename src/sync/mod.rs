//! NDT synchronization: streaming evaluation, drift-triggered retraining and
//! hot model swaps
//!
//! The loop owns all synchronization state. Retraining runs in a separate job
//! that the loop only polls; the job and the loop communicate through the
//! checkpoint directory, whose modification times decide when a swap is due.

mod accumulator;
mod action;
mod checkpoint;
mod config;
mod engine;
mod job;
mod metrics;
mod pacing;
mod policy;
mod state;


pub use accumulator::{ErrorOnly, SlaViolations, WindowAccumulator};
pub use action::DriftAction;
pub use checkpoint::{CheckpointLayout, CheckpointStore, FsCheckpointStore};
pub use config::SyncConfig;
pub use engine::{SyncLoop, SyncReport, SyncStats};
pub use job::{JobExit, JobLauncher, ProcessLauncher, RetrainJob, RetrainRequest, ThreadLauncher};
pub use metrics::{nmse_db, results_path, SlaSeries, SyncMetrics};
pub use pacing::{NoPacing, Pacer, SleepPacer};
pub use policy::CompletionPolicy;
pub use state::{InFlight, ModelVersion, SyncState};
