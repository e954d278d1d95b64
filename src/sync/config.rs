//! Configuration of the synchronization loop.

use super::policy::CompletionPolicy;
use crate::drift::DriftSignal;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration of the synchronization loop
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Allow retraining and hot swaps; drift is detected and logged either way
    pub sync_enabled: bool,
    /// Scalar fed to the drift detector
    pub signal: DriftSignal,
    /// How finished jobs are judged
    pub completion: CompletionPolicy,
    /// Consecutive checkpoint load failures tolerated before the run fails
    pub max_swap_failures: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_enabled: true,
            signal: DriftSignal::Traffic,
            completion: CompletionPolicy::AcceptUnconditionally,
            max_swap_failures: 3,
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_swap_failures == 0 {
            return Err(Error::ConfigError("max_swap_failures must be at least 1".to_string()));
        }
        Ok(())
    }
}
