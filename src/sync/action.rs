//! Outcome of a drift signal in the synchronization loop.

use super::state::ModelVersion;

/// What the loop did with a drift alarm
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriftAction {
    /// Alarm ignored: a retraining job is already running, or the window's
    /// drift was already handled
    None,
    /// Drift recorded, but synchronization is disabled
    DriftLogged,
    /// Drift recorded and a job spawned for the given version
    RetrainTriggered(ModelVersion),
    /// Drift recorded, but the ladder has no further training data
    LadderExhausted,
}
