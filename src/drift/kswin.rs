//! KSWIN: Kolmogorov-Smirnov windowed drift detection.

use super::statistical::{ks_p_value, ks_statistic_sorted};
use super::types::{ConceptDriftDetector, DriftResult};
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// KSWIN configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KswinConfig {
    /// Significance level of the KS test
    pub alpha: f64,
    /// Number of most recent values kept
    pub window_size: usize,
    /// Size of both compared sub-windows
    pub stat_size: usize,
    /// Seed of the reference sub-sampling
    pub seed: u64,
    /// KS statistic that must be exceeded in addition to `alpha`
    pub min_statistic: f64,
    /// Updates between two KS tests once the window is full; `stat_size`
    /// when unset
    ///
    /// A test sorts both sub-windows, so testing every `stat_size` updates
    /// keeps `update` at amortized O(log stat_size). Drift is then reported up
    /// to `interval - 1` values later than with a test on every update.
    pub test_interval: Option<usize>,
}

impl Default for KswinConfig {
    fn default() -> Self {
        Self { alpha: 0.001, window_size: 6800, stat_size: 1200, seed: 42, min_statistic: 0.1, test_interval: None }
    }
}

impl KswinConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::ConfigError(format!("KSWIN alpha must be in (0, 1), got {}", self.alpha)));
        }
        if self.stat_size == 0 {
            return Err(Error::ConfigError("KSWIN stat_size must be positive".to_string()));
        }
        if self.window_size < 2 * self.stat_size {
            return Err(Error::ConfigError(format!(
                "KSWIN window_size ({}) must be at least 2 * stat_size ({})",
                self.window_size, self.stat_size
            )));
        }
        if self.test_interval == Some(0) {
            return Err(Error::ConfigError("KSWIN test_interval must be positive".to_string()));
        }
        Ok(())
    }

    /// Updates between two tests after warm-up
    pub fn interval(&self) -> usize {
        self.test_interval.unwrap_or(self.stat_size)
    }
}

/// Windowed two-sample KS drift detector
///
/// Once `window_size` values are buffered, `stat_size` positions are drawn
/// without replacement from the oldest `window_size - stat_size` values and
/// compared against the `stat_size` most recent ones. The first test runs on
/// the update that fills the window, then every [`KswinConfig::interval`]
/// updates. On drift the buffer keeps
/// only the recent sub-window, so the alarm cannot fire again until the window
/// has refilled past the values that caused it.
#[derive(Debug)]
pub struct Kswin {
    config: KswinConfig,
    window: VecDeque<f64>,
    rng: StdRng,
    since_test: usize,
    tests_run: u64,
    drifted: bool,
    last: Option<DriftResult>,
    // Scratch buffers reused across tests
    reference: Vec<f64>,
    recent: Vec<f64>,
}

impl Kswin {
    pub fn new(config: KswinConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            window: VecDeque::with_capacity(config.window_size),
            since_test: 0,
            tests_run: 0,
            drifted: false,
            last: None,
            reference: Vec::with_capacity(config.stat_size),
            recent: Vec::with_capacity(config.stat_size),
            config,
        })
    }

    pub fn config(&self) -> &KswinConfig {
        &self.config
    }

    /// Values currently buffered
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// KS tests run since construction or the last reset
    pub fn tests_run(&self) -> u64 {
        self.tests_run
    }

    fn run_test(&mut self) -> DriftResult {
        let stat = self.config.stat_size;
        let older = self.config.window_size - stat;

        self.reference.clear();
        let picks = rand::seq::index::sample(&mut self.rng, older, stat);
        self.reference.extend(picks.iter().map(|i| self.window[i]));

        self.recent.clear();
        self.recent.extend(self.window.iter().skip(older).copied());

        self.reference.sort_by(f64::total_cmp);
        self.recent.sort_by(f64::total_cmp);

        let statistic = ks_statistic_sorted(&self.reference, &self.recent);
        // Equal sample sizes: n*m/(n+m) = n/2
        let lambda = statistic * (stat as f64 / 2.0).sqrt();
        let p_value = ks_p_value(lambda);
        let drifted = p_value <= self.config.alpha && statistic > self.config.min_statistic;
        DriftResult { statistic, p_value, drifted }
    }
}

impl ConceptDriftDetector for Kswin {
    fn update(&mut self, value: f64) {
        self.drifted = false;
        if self.window.len() == self.config.window_size {
            self.window.pop_front();
        }
        self.window.push_back(value);
        if self.window.len() < self.config.window_size {
            return;
        }

        let due = self.since_test == 0;
        self.since_test = (self.since_test + 1) % self.config.interval();
        if !due {
            return;
        }

        let result = self.run_test();
        self.tests_run += 1;
        self.last = Some(result);
        if result.drifted {
            self.drifted = true;
            self.since_test = 0;
            let keep = self.window.len() - self.config.stat_size;
            self.window.drain(..keep);
            tracing::debug!(
                statistic = result.statistic,
                p_value = result.p_value,
                "KSWIN drift"
            );
        }
    }

    fn drift_detected(&self) -> bool {
        self.drifted
    }

    fn name(&self) -> &'static str {
        "kswin"
    }

    fn last_result(&self) -> Option<DriftResult> {
        self.last
    }

    fn reset(&mut self) {
        self.window.clear();
        self.rng = StdRng::seed_from_u64(self.config.seed);
        self.since_test = 0;
        self.tests_run = 0;
        self.drifted = false;
        self.last = None;
    }
}
