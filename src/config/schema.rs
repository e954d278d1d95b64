//! YAML schema of an experiment file
//!
//! Every field has a default so a minimal file only names the topology and the
//! dataset root. Command-line flags are applied on top (see
//! [`crate::config::apply_overrides`]) and the result is validated before use.

use super::topology::{QosTarget, Topology};
use crate::drift::DetectorSettings;
use crate::error::{Error, Result};
use crate::sync::{CompletionPolicy, SyncConfig};
use crate::train::TrainConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Ladder entries used when none are configured
pub const DEFAULT_SUFFIXES: [u32; 4] = [0, 1, 2, 4];

/// How retraining jobs are run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LauncherKind {
    /// Child process running `gemelo train`
    #[default]
    Process,
    /// Background thread inside the running process
    Thread,
}

impl std::str::FromStr for LauncherKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "process" => Ok(LauncherKind::Process),
            "thread" => Ok(LauncherKind::Thread),
            _ => Err(format!("Unknown launcher: {s}. Valid launchers: process, thread")),
        }
    }
}

/// Location of the training ladder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSpec {
    /// Dataset root holding `{topology}/{dataset}{suffix}_cv` directories
    pub root: Option<PathBuf>,
    /// Ladder entry suffixes, in version order
    pub suffixes: Vec<u32>,
}

impl Default for DataSpec {
    fn default() -> Self {
        Self { root: None, suffixes: DEFAULT_SUFFIXES.to_vec() }
    }
}

/// Where a run writes checkpoints and results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSpec {
    pub checkpoint_dir: PathBuf,
    pub results_dir: PathBuf,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self { checkpoint_dir: PathBuf::from("weights"), results_dir: PathBuf::from("results") }
    }
}

/// Synchronization behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    /// Retrain and hot-swap on drift; drift is logged either way
    pub enabled: bool,
    pub completion: CompletionPolicy,
    pub max_swap_failures: usize,
    /// Record SLA violation counts (needs per-flow delay budgets)
    pub sla: bool,
    pub launcher: LauncherKind,
}

impl Default for SyncSection {
    fn default() -> Self {
        let defaults = SyncConfig::default();
        Self {
            enabled: false,
            completion: defaults.completion,
            max_swap_failures: defaults.max_swap_failures,
            sla: false,
            launcher: LauncherKind::default(),
        }
    }
}

/// Stream pacing while a job is outstanding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingSpec {
    pub enabled: bool,
    /// Sleep per flow in seconds
    pub delay_secs: f64,
    /// Pacing starts this many flows before the end of the first detector window
    pub margin: usize,
}

impl Default for PacingSpec {
    fn default() -> Self {
        Self { enabled: true, delay_secs: 0.8, margin: 200 }
    }
}

impl PacingSpec {
    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_secs.max(0.0))
    }
}

/// Complete experiment specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSpec {
    pub topology: Option<Topology>,
    pub target: QosTarget,
    pub data: DataSpec,
    pub output: OutputSpec,
    /// Number of independent repetitions of the run
    pub realizations: usize,
    pub sync: SyncSection,
    pub detector: DetectorSettings,
    pub training: TrainConfig,
    pub pacing: PacingSpec,
}

impl Default for SyncSpec {
    fn default() -> Self {
        Self {
            topology: None,
            target: QosTarget::default(),
            data: DataSpec::default(),
            output: OutputSpec::default(),
            realizations: 1,
            sync: SyncSection::default(),
            detector: DetectorSettings::default(),
            training: TrainConfig::default(),
            pacing: PacingSpec::default(),
        }
    }
}

impl SyncSpec {
    /// Topology, which validation guarantees is set
    pub fn topology(&self) -> Result<Topology> {
        self.topology
            .ok_or_else(|| Error::ConfigError("topology is required (--topology or `topology:`)".to_string()))
    }

    /// Dataset root, which validation guarantees is set
    pub fn data_root(&self) -> Result<&Path> {
        self.data
            .root
            .as_deref()
            .ok_or_else(|| Error::ConfigError("dataset root is required (--dir or `data.root`)".to_string()))
    }

    /// Loop configuration derived from the spec
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            sync_enabled: self.sync.enabled,
            signal: self.detector.signal,
            completion: self.sync.completion,
            max_swap_failures: self.sync.max_swap_failures,
        }
    }
}

/// Parse an experiment file
pub fn parse_spec(yaml: &str) -> Result<SyncSpec> {
    serde_yaml::from_str(yaml).map_err(|e| Error::ConfigError(format!("Failed to parse YAML config: {e}")))
}

/// Read and parse an experiment file
pub fn load_spec(path: &Path) -> Result<SyncSpec> {
    let yaml = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file {}: {e}", path.display())))?;
    parse_spec(&yaml)
}
