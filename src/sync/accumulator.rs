//! Per-window accumulation strategies

use super::metrics::{nmse_db, SyncMetrics};
use crate::data::Sample;
use crate::error::{Error, Result};

/// What the loop records for every window after inference
pub trait WindowAccumulator {
    /// Fresh metrics for a run
    fn metrics(&self) -> SyncMetrics {
        SyncMetrics::default()
    }

    /// Record one window; `predictions` has one value per flow
    fn record(&mut self, sample: &Sample, predictions: &[f32], metrics: &mut SyncMetrics) -> Result<()>;
}

/// NMSE per window only
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorOnly;

impl WindowAccumulator for ErrorOnly {
    fn record(&mut self, sample: &Sample, predictions: &[f32], metrics: &mut SyncMetrics) -> Result<()> {
        check_len(sample, predictions)?;
        metrics.error_per_window.push(nmse_db(&sample.labels, predictions));
        Ok(())
    }
}

/// NMSE plus SLA violation counts against each flow's delay budget
#[derive(Debug, Clone, Copy, Default)]
pub struct SlaViolations;

impl WindowAccumulator for SlaViolations {
    fn metrics(&self) -> SyncMetrics {
        SyncMetrics::with_sla()
    }

    fn record(&mut self, sample: &Sample, predictions: &[f32], metrics: &mut SyncMetrics) -> Result<()> {
        check_len(sample, predictions)?;
        let budget = sample.features.flow_delay_budget.as_deref().ok_or_else(|| {
            Error::ConfigError("SLA accounting needs flow_delay_budget in every window".to_string())
        })?;

        let (mut predicted, mut actual, mut correct) = (0, 0, 0);
        for ((&y, &y_hat), &b) in sample.labels.iter().zip(predictions).zip(budget) {
            let predicted_violation = y_hat > b;
            let true_violation = y > b;
            predicted += usize::from(predicted_violation);
            actual += usize::from(true_violation);
            correct += usize::from(predicted_violation == true_violation);
        }

        metrics.error_per_window.push(nmse_db(&sample.labels, predictions));
        metrics.sla.get_or_insert_with(Default::default).push(predicted, actual, correct);
        Ok(())
    }
}

fn check_len(sample: &Sample, predictions: &[f32]) -> Result<()> {
    if predictions.len() != sample.labels.len() {
        return Err(Error::ShapeMismatch {
            field: "predictions".to_string(),
            expected: sample.labels.len(),
            actual: predictions.len(),
        });
    }
    Ok(())
}
