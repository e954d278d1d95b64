//! Loop-owned synchronization state

use super::job::RetrainJob;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a trained model; version `v` is trained on ladder entry `v`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ModelVersion(pub usize);

impl ModelVersion {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Retraining job currently outstanding
pub struct InFlight {
    /// Version the job is training
    pub version: ModelVersion,
    pub job: Box<dyn RetrainJob>,
    /// Window at which the job was spawned
    pub spawned_at: usize,
}

/// Whether a retraining job is outstanding
///
/// At most one job exists at a time because the only way to spawn one is the
/// `Idle -> Retraining` transition.
#[derive(Default)]
pub enum SyncState {
    #[default]
    Idle,
    Retraining(InFlight),
}

impl SyncState {
    pub fn is_retraining(&self) -> bool {
        matches!(self, SyncState::Retraining(_))
    }
}

impl fmt::Debug for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Idle => f.write_str("Idle"),
            SyncState::Retraining(job) => f
                .debug_struct("Retraining")
                .field("version", &job.version)
                .field("spawned_at", &job.spawned_at)
                .finish(),
        }
    }
}
