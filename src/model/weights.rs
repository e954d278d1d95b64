//! Serializable parameters of the twin's regression head

use crate::config::QosTarget;
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// One-hidden-layer parameters, row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwinWeights {
    pub input_dim: usize,
    pub hidden_dim: usize,
    /// `(hidden_dim, input_dim)`
    pub w1: Vec<f32>,
    pub b1: Vec<f32>,
    pub w2: Vec<f32>,
    pub b2: f32,
}

impl TwinWeights {
    /// LeCun-uniform initialisation from a seed
    pub fn init(input_dim: usize, hidden_dim: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let limit1 = (3.0 / input_dim as f32).sqrt();
        let limit2 = (3.0 / hidden_dim as f32).sqrt();
        Self {
            input_dim,
            hidden_dim,
            w1: (0..input_dim * hidden_dim).map(|_| rng.random_range(-limit1..limit1)).collect(),
            b1: vec![0.0; hidden_dim],
            w2: (0..hidden_dim).map(|_| rng.random_range(-limit2..limit2)).collect(),
            b2: -3.0,
        }
    }

    /// All-zero parameters with the same shape (gradient accumulator)
    pub fn zeros_like(&self) -> Self {
        Self {
            input_dim: self.input_dim,
            hidden_dim: self.hidden_dim,
            w1: vec![0.0; self.w1.len()],
            b1: vec![0.0; self.b1.len()],
            w2: vec![0.0; self.w2.len()],
            b2: 0.0,
        }
    }

    /// Check buffer lengths against the declared dimensions
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("w1", self.input_dim * self.hidden_dim, self.w1.len()),
            ("b1", self.hidden_dim, self.b1.len()),
            ("w2", self.hidden_dim, self.w2.len()),
        ];
        for (field, expected, actual) in checks {
            if expected != actual {
                return Err(Error::ShapeMismatch { field: field.to_string(), expected, actual });
            }
        }
        if self.hidden_dim == 0 || self.input_dim == 0 {
            return Err(Error::ConfigError("twin dimensions must be positive".to_string()));
        }
        Ok(())
    }

    /// Whether every parameter is finite
    pub fn is_finite(&self) -> bool {
        self.b2.is_finite()
            && self.w1.iter().chain(&self.b1).chain(&self.w2).all(|v| v.is_finite())
    }

    /// Mutable parameter buffers in a stable order, for the optimizer
    pub fn buffers_mut(&mut self) -> [&mut [f32]; 4] {
        [
            self.w1.as_mut_slice(),
            self.b1.as_mut_slice(),
            self.w2.as_mut_slice(),
            std::slice::from_mut(&mut self.b2),
        ]
    }

    /// Parameter buffers in the same order as [`Self::buffers_mut`]
    pub fn buffers(&self) -> [&[f32]; 4] {
        [&self.w1[..], &self.b1[..], &self.w2[..], std::slice::from_ref(&self.b2)]
    }
}

/// Checkpoint file content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointFile {
    pub target: QosTarget,
    pub epoch: usize,
    pub weights: TwinWeights,
}
