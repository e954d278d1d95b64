//! The virtual twin: per-flow QoS regression over window features

use super::features::{extract, INPUT_DIM};
use super::weights::TwinWeights;
use crate::config::QosTarget;
use crate::data::{FlowFeatures, NormalizationTable};
use crate::error::{Error, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Default width of the hidden layer
pub const DEFAULT_HIDDEN_DIM: usize = 32;

fn softplus(z: f32) -> f32 {
    if z > 20.0 {
        z
    } else {
        z.exp().ln_1p()
    }
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

/// Intermediate values of one forward pass, kept for the backward pass
#[derive(Debug, Clone)]
pub struct ForwardPass {
    x: Array2<f32>,
    hidden: Array2<f32>,
    logits: Array1<f32>,
    /// Per-flow predictions
    pub output: Vec<f32>,
}

/// Learned model of per-flow delay or jitter
///
/// Predictions are `softplus(w2 · tanh(W1 x + b1) + b2)`, plus the raw path
/// propagation delay when the target is delay. A twin cannot predict until
/// [`VirtualTwin::set_normalization`] has been called.
#[derive(Debug, Clone)]
pub struct VirtualTwin {
    target: QosTarget,
    weights: TwinWeights,
    normalization: Option<NormalizationTable>,
}

impl VirtualTwin {
    /// Freshly initialised twin without normalization
    pub fn untrained(target: QosTarget, hidden_dim: usize, seed: u64) -> Self {
        Self { target, weights: TwinWeights::init(INPUT_DIM, hidden_dim, seed), normalization: None }
    }

    /// Twin with weights loaded from a checkpoint
    pub fn from_weights(target: QosTarget, weights: TwinWeights) -> Result<Self> {
        weights.validate()?;
        if weights.input_dim != INPUT_DIM {
            return Err(Error::ShapeMismatch {
                field: "input_dim".to_string(),
                expected: INPUT_DIM,
                actual: weights.input_dim,
            });
        }
        Ok(Self { target, weights, normalization: None })
    }

    pub fn target(&self) -> QosTarget {
        self.target
    }

    pub fn weights(&self) -> &TwinWeights {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut TwinWeights {
        &mut self.weights
    }

    pub fn set_weights(&mut self, weights: TwinWeights) {
        self.weights = weights;
    }

    /// Install the statistics fitted on the training split
    pub fn set_normalization(&mut self, table: NormalizationTable) {
        self.normalization = Some(table);
    }

    pub fn normalization(&self) -> Option<&NormalizationTable> {
        self.normalization.as_ref()
    }

    /// Predict the target for every flow of a window
    pub fn predict(&self, features: &FlowFeatures) -> Result<Vec<f32>> {
        Ok(self.forward(features)?.output)
    }

    /// Forward pass keeping intermediates
    pub fn forward(&self, features: &FlowFeatures) -> Result<ForwardPass> {
        let table = self.normalization.as_ref().ok_or(Error::MissingNormalization)?;
        let x = extract(features, table)?;

        let w = &self.weights;
        let w1 = ArrayView2::from_shape((w.hidden_dim, w.input_dim), &w.w1).map_err(|_| {
            Error::ShapeMismatch { field: "w1".to_string(), expected: w.hidden_dim * w.input_dim, actual: w.w1.len() }
        })?;
        let b1 = ArrayView1::from(&w.b1[..]);
        let w2 = ArrayView1::from(&w.w2[..]);

        let hidden = (x.dot(&w1.t()) + &b1).mapv(f32::tanh);
        let logits = hidden.dot(&w2) + w.b2;

        let output = logits
            .iter()
            .zip(&features.flow_propag_delay)
            .map(|(&z, &propag)| {
                let queueing = softplus(z);
                if self.target.includes_propagation() {
                    queueing + propag
                } else {
                    queueing
                }
            })
            .collect();

        Ok(ForwardPass { x, hidden, logits, output })
    }

    /// Gradients of the loss w.r.t. every parameter given `dL/d output`
    pub fn backward(&self, pass: &ForwardPass, grad_output: &[f32]) -> Result<TwinWeights> {
        if grad_output.len() != pass.output.len() {
            return Err(Error::ShapeMismatch {
                field: "grad_output".to_string(),
                expected: pass.output.len(),
                actual: grad_output.len(),
            });
        }
        let w = &self.weights;

        // d softplus / dz = sigmoid(z)
        let dz: Array1<f32> = pass
            .logits
            .iter()
            .zip(grad_output)
            .map(|(&z, &g)| g * sigmoid(z))
            .collect();

        let dw2 = pass.hidden.t().dot(&dz);
        let db2 = dz.sum();

        let w2 = ArrayView1::from(&w.w2[..]);
        let dh = dz
            .view()
            .insert_axis(Axis(1))
            .dot(&w2.insert_axis(Axis(0)));
        let da = dh * pass.hidden.mapv(|h| 1.0 - h * h);

        let dw1 = da.t().dot(&pass.x);
        let db1 = da.sum_axis(Axis(0));

        Ok(TwinWeights {
            input_dim: w.input_dim,
            hidden_dim: w.hidden_dim,
            w1: dw1.iter().copied().collect(),
            b1: db1.to_vec(),
            w2: dw2.to_vec(),
            b2: db2,
        })
    }
}
