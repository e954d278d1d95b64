//! Experiment specification validation
//!
//! Runs before any file is written so a bad experiment fails without side
//! effects.

use super::error::ValidationError;
use crate::config::schema::SyncSpec;
use std::collections::BTreeSet;

/// Validate an experiment specification
///
/// Checks:
/// - topology and dataset root are set (and the root exists outside tests)
/// - the ladder is non-empty without repeated entries
/// - training, pacing, swap and detector settings are in range
pub fn validate_spec(spec: &SyncSpec) -> Result<(), ValidationError> {
    let topology = spec.topology.ok_or(ValidationError::MissingTopology)?;
    let root = spec.data.root.as_ref().ok_or(ValidationError::MissingDataRoot)?;

    // unit tests validate specs that point at imaginary roots
    if cfg!(not(test)) && !root.exists() {
        return Err(ValidationError::DataRootNotFound(root.display().to_string()));
    }

    if spec.data.suffixes.is_empty() {
        return Err(ValidationError::EmptyLadder);
    }
    let mut seen = BTreeSet::new();
    for &suffix in &spec.data.suffixes {
        if !seen.insert(suffix) {
            return Err(ValidationError::DuplicateSuffix(suffix));
        }
    }

    if spec.realizations == 0 {
        return Err(ValidationError::InvalidRealizations(spec.realizations));
    }
    if spec.training.epochs == 0 {
        return Err(ValidationError::InvalidEpochs(spec.training.epochs));
    }
    if !(spec.training.lr > 0.0 && spec.training.lr <= 1.0) {
        return Err(ValidationError::InvalidLearningRate(spec.training.lr));
    }

    if !(spec.pacing.delay_secs.is_finite() && spec.pacing.delay_secs >= 0.0) {
        return Err(ValidationError::InvalidPacingDelay(spec.pacing.delay_secs));
    }
    if spec.sync.max_swap_failures == 0 {
        return Err(ValidationError::InvalidSwapFailures(spec.sync.max_swap_failures));
    }

    spec.detector
        .validate(topology.window_size())
        .map_err(|e| ValidationError::InvalidDetector(e.to_string()))?;

    Ok(())
}
