//! Training hyperparameters

use super::loss::LossKind;
use crate::error::{Error, Result};
use crate::model::DEFAULT_HIDDEN_DIM;
use serde::{Deserialize, Serialize};

/// Early stopping on the validation loss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarlyStoppingConfig {
    pub enabled: bool,
    pub patience: usize,
    pub min_delta: f32,
    pub start_from_epoch: usize,
    /// Return the weights of the best validation epoch instead of the last one
    pub restore_best: bool,
}

impl Default for EarlyStoppingConfig {
    fn default() -> Self {
        Self { enabled: true, patience: 10, min_delta: 0.0002, start_from_epoch: 4, restore_best: true }
    }
}

/// Learning-rate reduction when the validation loss stalls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateauConfig {
    pub enabled: bool,
    pub factor: f32,
    pub patience: usize,
    pub min_delta: f32,
}

impl Default for PlateauConfig {
    fn default() -> Self {
        Self { enabled: true, factor: 0.5, patience: 5, min_delta: 0.001 }
    }
}

/// Hyperparameters of one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs: usize,
    pub lr: f32,
    pub loss: LossKind,
    pub hidden_dim: usize,
    /// Seed of the weight initialisation
    pub seed: u64,
    /// Global gradient-norm clip per step
    pub max_grad_norm: Option<f32>,
    pub early_stopping: EarlyStoppingConfig,
    pub plateau: PlateauConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            lr: 0.001,
            loss: LossKind::Mape,
            hidden_dim: DEFAULT_HIDDEN_DIM,
            seed: 0,
            max_grad_norm: Some(100.0),
            early_stopping: EarlyStoppingConfig::default(),
            plateau: PlateauConfig::default(),
        }
    }
}

impl TrainConfig {
    /// Reject settings that cannot train; performs no I/O
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidEpochs(self.epochs));
        }
        if !(self.lr > 0.0 && self.lr.is_finite()) {
            return Err(Error::ConfigError(format!("learning rate must be positive, got {}", self.lr)));
        }
        if self.hidden_dim == 0 {
            return Err(Error::ConfigError("hidden_dim must be positive".to_string()));
        }
        if self.plateau.enabled && !(self.plateau.factor > 0.0 && self.plateau.factor < 1.0) {
            return Err(Error::ConfigError(format!(
                "plateau factor must be in (0, 1), got {}",
                self.plateau.factor
            )));
        }
        if matches!(self.max_grad_norm, Some(n) if n <= 0.0) {
            return Err(Error::ConfigError("max_grad_norm must be positive".to_string()));
        }
        Ok(())
    }
}
