//! Validation error types

use crate::error::Error;

/// Reasons an experiment specification is rejected
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Topology is required")]
    MissingTopology,

    #[error("Dataset root is required")]
    MissingDataRoot,

    #[error("Dataset root does not exist: {0}")]
    DataRootNotFound(String),

    #[error("Training ladder needs at least one suffix")]
    EmptyLadder,

    #[error("Training ladder repeats suffix {0}")]
    DuplicateSuffix(u32),

    #[error("Invalid realizations: {0} (must be > 0)")]
    InvalidRealizations(usize),

    #[error("Invalid epochs: {0} (must be > 0)")]
    InvalidEpochs(usize),

    #[error("Invalid learning rate: {0} (must be > 0.0 and <= 1.0)")]
    InvalidLearningRate(f32),

    #[error("Invalid pacing delay: {0} (must be finite and >= 0)")]
    InvalidPacingDelay(f64),

    #[error("Invalid max_swap_failures: {0} (must be > 0)")]
    InvalidSwapFailures(usize),

    #[error("Invalid detector settings: {0}")]
    InvalidDetector(String),
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::InvalidEpochs(n) => Error::InvalidEpochs(n),
            other => Error::ConfigError(format!("Invalid config: {other}")),
        }
    }
}
