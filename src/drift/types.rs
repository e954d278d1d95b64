//! Type definitions for drift detection.

use serde::{Deserialize, Serialize};

/// Scalar stream a detector watches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftSignal {
    /// Per-flow offered traffic, one update per flow
    #[default]
    Traffic,
    /// Per-window NMSE in dB, one update per window
    WindowError,
}

impl DriftSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriftSignal::Traffic => "traffic",
            DriftSignal::WindowError => "window_error",
        }
    }
}

/// Outcome of the most recent test a detector ran
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DriftResult {
    /// Test statistic value
    pub statistic: f64,
    /// P-value, or `NaN` for tests without one
    pub p_value: f64,
    /// Whether drift was detected
    pub drifted: bool,
}

/// Level-triggered concept drift detector over a scalar stream
///
/// `drift_detected` reflects the last `update` only. Detectors are causal and
/// never error; during warm-up they simply report no drift.
pub trait ConceptDriftDetector: Send {
    /// Feed the next value of the stream
    fn update(&mut self, value: f64);

    /// Whether the last update raised drift
    fn drift_detected(&self) -> bool;

    /// Short detector name for logs
    fn name(&self) -> &'static str;

    /// Result of the last test that actually ran
    fn last_result(&self) -> Option<DriftResult> {
        None
    }

    /// Forget all observed values
    fn reset(&mut self);
}
