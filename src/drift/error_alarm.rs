//! Threshold alarm over the per-window prediction error.

use super::types::{ConceptDriftDetector, DriftResult};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorAlarmConfig {
    /// NMSE (dB) above which an observation counts as degraded
    pub threshold_db: f64,
    /// Drift is raised once more than this many consecutive observations are degraded
    pub alarm_limit: usize,
}

impl Default for ErrorAlarmConfig {
    fn default() -> Self {
        Self { threshold_db: -5.0, alarm_limit: 3 }
    }
}

impl ErrorAlarmConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.threshold_db.is_finite() {
            return Err(Error::ConfigError("error alarm threshold must be finite".to_string()));
        }
        Ok(())
    }
}

/// Counts consecutive windows whose error exceeds a threshold
///
/// Non-finite errors count as degraded. The counter resets when the alarm
/// fires and whenever an observation falls back under the threshold.
#[derive(Debug)]
pub struct ErrorAlarm {
    config: ErrorAlarmConfig,
    consecutive: usize,
    drifted: bool,
    last: Option<DriftResult>,
}

impl ErrorAlarm {
    pub fn new(config: ErrorAlarmConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, consecutive: 0, drifted: false, last: None })
    }

    /// Current run of degraded observations
    pub fn consecutive(&self) -> usize {
        self.consecutive
    }
}

impl ConceptDriftDetector for ErrorAlarm {
    fn update(&mut self, value: f64) {
        let degraded = !value.is_finite() || value > self.config.threshold_db;
        self.consecutive = if degraded { self.consecutive + 1 } else { 0 };
        self.drifted = self.consecutive > self.config.alarm_limit;
        if self.drifted {
            self.consecutive = 0;
        }
        self.last = Some(DriftResult { statistic: value, p_value: f64::NAN, drifted: self.drifted });
    }

    fn drift_detected(&self) -> bool {
        self.drifted
    }

    fn name(&self) -> &'static str {
        "error_alarm"
    }

    fn last_result(&self) -> Option<DriftResult> {
        self.last
    }

    fn reset(&mut self) {
        self.consecutive = 0;
        self.drifted = false;
        self.last = None;
    }
}
