//! Concept drift detection over the monitored stream
//!
//! Provides the detectors the synchronization loop can run:
//! - KSWIN, a windowed two-sample Kolmogorov-Smirnov test on per-flow traffic
//! - an error-threshold alarm on the per-window NMSE

mod error_alarm;
mod kswin;
mod statistical;
mod types;


pub use error_alarm::{ErrorAlarm, ErrorAlarmConfig};
pub use kswin::{Kswin, KswinConfig};
pub use statistical::{ks_p_value, ks_statistic, ks_statistic_sorted, ks_two_sample};
pub use types::{ConceptDriftDetector, DriftResult, DriftSignal};

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Detector selection as it appears in experiment files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub signal: DriftSignal,
    pub alpha: f64,
    /// KSWIN window; the topology's window when unset
    pub window_size: Option<usize>,
    pub stat_size: usize,
    pub seed: u64,
    /// Updates between KS tests; `stat_size` when unset
    pub test_interval: Option<usize>,
    pub error_threshold_db: f64,
    pub alarm_limit: usize,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        let kswin = KswinConfig::default();
        let alarm = ErrorAlarmConfig::default();
        Self {
            signal: DriftSignal::Traffic,
            alpha: kswin.alpha,
            window_size: None,
            stat_size: kswin.stat_size,
            seed: kswin.seed,
            test_interval: kswin.test_interval,
            error_threshold_db: alarm.threshold_db,
            alarm_limit: alarm.alarm_limit,
        }
    }
}

impl DetectorSettings {
    /// KSWIN configuration, falling back to `default_window`
    pub fn kswin_config(&self, default_window: usize) -> KswinConfig {
        KswinConfig {
            alpha: self.alpha,
            window_size: self.window_size.unwrap_or(default_window),
            stat_size: self.stat_size,
            seed: self.seed,
            test_interval: self.test_interval,
            ..KswinConfig::default()
        }
    }

    pub fn error_alarm_config(&self) -> ErrorAlarmConfig {
        ErrorAlarmConfig { threshold_db: self.error_threshold_db, alarm_limit: self.alarm_limit }
    }

    /// Validate the settings of the selected detector
    pub fn validate(&self, default_window: usize) -> Result<()> {
        match self.signal {
            DriftSignal::Traffic => self.kswin_config(default_window).validate(),
            DriftSignal::WindowError => self.error_alarm_config().validate(),
        }
    }

    /// Build the detector for the selected signal
    pub fn build(&self, default_window: usize) -> Result<Box<dyn ConceptDriftDetector>> {
        Ok(match self.signal {
            DriftSignal::Traffic => Box::new(Kswin::new(self.kswin_config(default_window))?),
            DriftSignal::WindowError => Box::new(ErrorAlarm::new(self.error_alarm_config())?),
        })
    }
}
