//! Regression losses over per-flow predictions

use serde::{Deserialize, Serialize};

/// Loss function returning the value and `dL/d prediction`
pub trait LossFn: Send + Sync {
    /// Compute loss and gradient; both slices have the same length
    fn forward(&self, predictions: &[f32], targets: &[f32]) -> (f32, Vec<f32>);

    /// Get loss function name
    fn name(&self) -> &'static str;
}

/// Mean Absolute Percentage Error
///
/// L = 100 * mean(|y - ŷ| / max(|y|, ε))
pub struct MapeLoss;

const MAPE_EPSILON: f32 = 1e-7;

impl LossFn for MapeLoss {
    fn forward(&self, predictions: &[f32], targets: &[f32]) -> (f32, Vec<f32>) {
        let n = predictions.len().max(1) as f32;
        let mut total = 0.0f32;
        let grad = predictions
            .iter()
            .zip(targets)
            .map(|(&p, &y)| {
                let denom = y.abs().max(MAPE_EPSILON);
                let diff = p - y;
                total += diff.abs() / denom;
                100.0 * diff.signum() * f32::from(diff != 0.0) / (denom * n)
            })
            .collect();
        (100.0 * total / n, grad)
    }

    fn name(&self) -> &'static str {
        "MAPE"
    }
}

/// Mean Squared Error
///
/// L = mean((ŷ - y)^2)
pub struct MseLoss;

impl LossFn for MseLoss {
    fn forward(&self, predictions: &[f32], targets: &[f32]) -> (f32, Vec<f32>) {
        let n = predictions.len().max(1) as f32;
        let mut total = 0.0f32;
        let grad = predictions
            .iter()
            .zip(targets)
            .map(|(&p, &y)| {
                let diff = p - y;
                total += diff * diff;
                2.0 * diff / n
            })
            .collect();
        (total / n, grad)
    }

    fn name(&self) -> &'static str {
        "MSE"
    }
}

/// Loss selection in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LossKind {
    #[default]
    Mape,
    Mse,
}

impl LossKind {
    pub fn build(&self) -> Box<dyn LossFn> {
        match self {
            LossKind::Mape => Box::new(MapeLoss),
            LossKind::Mse => Box::new(MseLoss),
        }
    }
}
