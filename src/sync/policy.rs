//! How a finished retraining job is judged.

use super::job::JobExit;
use serde::{Deserialize, Serialize};

/// Decides whether the outcome of a finished job may be swapped in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// Any exit counts as completion; the checkpoint mtime alone decides the swap
    #[default]
    AcceptUnconditionally,
    /// Only a successful exit counts
    VerifyExitStatus,
    /// The job must exit successfully and leave a `.ready` manifest
    VerifyCheckpoint,
}

impl CompletionPolicy {
    /// Whether the job's result is usable
    pub fn accepts(&self, exit: &JobExit, manifest_present: bool) -> bool {
        match self {
            CompletionPolicy::AcceptUnconditionally => true,
            CompletionPolicy::VerifyExitStatus => exit.is_success(),
            CompletionPolicy::VerifyCheckpoint => exit.is_success() && manifest_present,
        }
    }
}
