//! Per-run metrics and the results file
//!
//! All sequences are indexed by window. `drift_detected` and `model_updated`
//! hold window indices and are strictly increasing. The file is written once,
//! when the loop terminates.

use crate::config::{QosTarget, Topology};
use crate::error::{Error, Result};
use crate::train::write_json_atomic;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::{Path, PathBuf};

/// Normalized mean squared error in dB: `10 log10(mean((y - ŷ)²) / mean(y²))`
///
/// NaN for an empty window; infinite when every label is zero.
pub fn nmse_db(labels: &[f32], predictions: &[f32]) -> f64 {
    let n = labels.len().min(predictions.len());
    if n == 0 {
        return f64::NAN;
    }
    let (err, power) = labels.iter().zip(predictions).fold((0.0f64, 0.0f64), |(e, p), (&y, &y_hat)| {
        let (y, y_hat) = (f64::from(y), f64::from(y_hat));
        (e + (y - y_hat).powi(2), p + y * y)
    });
    10.0 * ((err / n as f64) / (power / n as f64)).log10()
}

/// Per-window SLA violation counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlaSeries {
    /// Flows predicted to exceed their budget
    pub predicted_violations: Vec<usize>,
    /// Flows that actually exceeded their budget
    pub true_violations: Vec<usize>,
    /// Flows where prediction and ground truth agree
    pub correct_predictions: Vec<usize>,
}

impl SlaSeries {
    pub fn push(&mut self, predicted: usize, actual: usize, correct: usize) {
        self.predicted_violations.push(predicted);
        self.true_violations.push(actual);
        self.correct_predictions.push(correct);
    }

    pub fn len(&self) -> usize {
        self.correct_predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.correct_predictions.is_empty()
    }
}

/// Metrics accumulated by one synchronization run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncMetrics {
    /// NMSE in dB of every window; non-finite values are stored as `null`
    #[serde(serialize_with = "nan_as_null::serialize", deserialize_with = "nan_as_null::deserialize")]
    pub error_per_window: Vec<f64>,
    /// Windows in which drift was detected
    pub drift_detected: Vec<usize>,
    /// Windows at whose start a new model was swapped in
    pub model_updated: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sla: Option<SlaSeries>,
}

impl SyncMetrics {
    /// Metrics that also collect SLA counts
    pub fn with_sla() -> Self {
        Self { sla: Some(SlaSeries::default()), ..Self::default() }
    }

    /// Windows accumulated so far
    pub fn windows(&self) -> usize {
        self.error_per_window.len()
    }

    /// Record a drift in `window`; repeated drifts within a window are kept once
    pub fn record_drift(&mut self, window: usize) -> bool {
        push_increasing(&mut self.drift_detected, window)
    }

    /// Record a swap at the start of `window`
    pub fn record_update(&mut self, window: usize) -> bool {
        push_increasing(&mut self.model_updated, window)
    }

    /// Mean NMSE of the segments delimited by `change_points`
    ///
    /// Change points outside the run are ignored. Non-finite windows are
    /// skipped; a segment without finite windows has a NaN mean.
    pub fn segment_means(&self, change_points: &[usize]) -> Vec<f64> {
        let n = self.error_per_window.len();
        let mut bounds: Vec<usize> = change_points.iter().copied().filter(|&c| c > 0 && c < n).collect();
        bounds.sort_unstable();
        bounds.dedup();
        bounds.insert(0, 0);
        bounds.push(n);

        bounds
            .windows(2)
            .map(|seg| {
                let finite: Vec<f64> =
                    self.error_per_window[seg[0]..seg[1]].iter().copied().filter(|v| v.is_finite()).collect();
                if finite.is_empty() {
                    f64::NAN
                } else {
                    finite.iter().sum::<f64>() / finite.len() as f64
                }
            })
            .collect()
    }

    /// Check the index invariants against the number of windows
    pub fn validate(&self) -> Result<()> {
        let n = self.windows();
        for (name, seq) in [("drift_detected", &self.drift_detected), ("model_updated", &self.model_updated)] {
            if seq.windows(2).any(|w| w[0] >= w[1]) {
                return Err(Error::Serialization(format!("{name} is not strictly increasing")));
            }
            if seq.last().is_some_and(|&last| last >= n) {
                return Err(Error::Serialization(format!("{name} points past the last window")));
            }
        }
        if let Some(sla) = &self.sla {
            if sla.len() != n {
                return Err(Error::Serialization(format!("sla counts cover {} of {n} windows", sla.len())));
            }
        }
        Ok(())
    }

    /// Write the results file in one atomic write
    pub fn persist(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let metrics: Self = serde_json::from_slice(&data)
            .map_err(|e| Error::Serialization(format!("{}: {e}", path.display())))?;
        metrics.validate()?;
        Ok(metrics)
    }
}

fn push_increasing(seq: &mut Vec<usize>, window: usize) -> bool {
    if seq.last().is_some_and(|&last| last >= window) {
        return false;
    }
    seq.push(window);
    true
}

/// `{results}/{topology}/results_{target}_sync_{sync}_r_{r}.json`, or the
/// `uc_violations_` prefix for runs with SLA counts
pub fn results_path(
    results_dir: &Path,
    topology: Topology,
    target: QosTarget,
    sync_enabled: bool,
    realization: usize,
    sla: bool,
) -> PathBuf {
    let prefix = if sla { "uc_violations" } else { "results" };
    results_dir.join(topology.as_str()).join(format!(
        "{prefix}_{}_sync_{}_r_{realization}.json",
        target.as_str(),
        sync_enabled
    ))
}

mod nan_as_null {
    use super::*;

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| v.is_finite().then_some(*v)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<f64>, D::Error> {
        let values: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}
