//! Error types with actionable diagnostics.
//!
//! Every failure the synchronization core can surface maps to one variant here.
//! Configuration problems are detected before the loop starts; everything else
//! propagates to the entry point and terminates the run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for gemelo operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while training, evaluating or synchronizing a twin.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration value or file.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Topology name without a known profile.
    #[error("Unsupported topology: {0}\n  → Supported topologies: 5g_crosshaul, germany, passion")]
    UnsupportedTopology(String),

    /// QoS target without a model class.
    #[error("Unsupported QoS target: {0}\n  → Supported targets: delay, jitter")]
    UnsupportedTarget(String),

    /// Epoch count must be positive.
    #[error("Invalid epochs: {0} (must be > 0)")]
    InvalidEpochs(usize),

    /// The model was invoked before `set_normalization`.
    #[error("Model invoked before its normalization table was set\n  → Call set_normalization() with statistics from the training split")]
    MissingNormalization,

    /// Malformed or unreadable dataset content.
    #[error("Dataset error in {path}: {message}")]
    Dataset { path: PathBuf, message: String },

    /// Array lengths that must agree do not.
    #[error("Shape mismatch for {field}: expected {expected}, got {actual}")]
    ShapeMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// Checkpoint missing, unreadable or inconsistent with the model.
    #[error("Checkpoint error at {path}: {message}")]
    Checkpoint { path: PathBuf, message: String },

    /// Loss became non-finite during fitting.
    #[error("Training diverged at epoch {epoch}: loss = {loss}\n  → Lower the learning rate or inspect the training split")]
    TrainingDiverged { epoch: usize, loss: f32 },

    /// Training stopped because its job was cancelled.
    #[error("Training cancelled")]
    Cancelled,

    /// Retraining job could not be launched or supervised.
    #[error("Retraining job error: {0}")]
    Job(String),

    /// JSON/YAML encoding failures.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a dataset error for the given path.
    pub fn dataset(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Dataset { path: path.into(), message: message.into() }
    }

    /// Build a checkpoint error for the given path.
    pub fn checkpoint(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Checkpoint { path: path.into(), message: message.into() }
    }

    /// Whether the error was caused by invalid operator input rather than a runtime fault.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_)
                | Self::UnsupportedTopology(_)
                | Self::UnsupportedTarget(_)
                | Self::InvalidEpochs(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON: {e}"))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Serialization(format!("YAML: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_classified() {
        assert!(Error::ConfigError("x".into()).is_config_error());
        assert!(Error::UnsupportedTopology("mesh".into()).is_config_error());
        assert!(Error::UnsupportedTarget("loss".into()).is_config_error());
        assert!(Error::InvalidEpochs(0).is_config_error());
        assert!(!Error::MissingNormalization.is_config_error());
        assert!(!Error::Cancelled.is_config_error());
    }

    #[test]
    fn test_messages_carry_context() {
        let err = Error::UnsupportedTopology("mesh".into());
        let msg = err.to_string();
        assert!(msg.contains("mesh"));
        assert!(msg.contains("germany"));

        let err = Error::TrainingDiverged { epoch: 3, loss: f32::NAN };
        assert!(err.to_string().contains("epoch 3"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_dataset_helper() {
        let err = Error::dataset("/tmp/x", "bad line");
        match err {
            Error::Dataset { path, message } => {
                assert_eq!(path, PathBuf::from("/tmp/x"));
                assert_eq!(message, "bad line");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
