//! Topology profiles and QoS targets

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Network topology an experiment runs against
///
/// The topology fixes the dataset naming convention and the drift detector
/// window used for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topology {
    /// 5G-Crosshaul transport network
    #[serde(rename = "5g_crosshaul")]
    FiveGCrosshaul,
    /// German backbone (Nobel-Germany)
    #[serde(rename = "germany")]
    Germany,
    /// PASSION metro network
    #[serde(rename = "passion")]
    Passion,
}

impl Topology {
    /// Identifier used on the command line and in directory names
    pub fn as_str(&self) -> &'static str {
        match self {
            Topology::FiveGCrosshaul => "5g_crosshaul",
            Topology::Germany => "germany",
            Topology::Passion => "passion",
        }
    }

    /// Dataset prefix for ladder entries of this topology
    pub fn dataset_name(&self) -> &'static str {
        match self {
            Topology::FiveGCrosshaul => "experiment_10",
            Topology::Germany => "experiment_20",
            Topology::Passion => "experiment_30",
        }
    }

    /// Drift detector window size for this topology
    pub fn window_size(&self) -> usize {
        match self {
            Topology::FiveGCrosshaul | Topology::Passion => 6800,
            Topology::Germany => 7000,
        }
    }

    /// Dataset directory for one ladder entry: `{root}/{topology}/{dataset}{suffix}_cv`
    pub fn dataset_dir(&self, data_root: &Path, suffix: u32) -> PathBuf {
        data_root
            .join(self.as_str())
            .join(format!("{}{}_cv", self.dataset_name(), suffix))
    }
}

impl FromStr for Topology {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "5g_crosshaul" => Ok(Topology::FiveGCrosshaul),
            "germany" => Ok(Topology::Germany),
            "passion" => Ok(Topology::Passion),
            other => Err(Error::UnsupportedTopology(other.to_string())),
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// QoS metric predicted by the twin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QosTarget {
    /// Per-flow mean delay
    #[default]
    Delay,
    /// Per-flow jitter
    Jitter,
}

impl QosTarget {
    /// Identifier used on the command line and in checkpoint names
    pub fn as_str(&self) -> &'static str {
        match self {
            QosTarget::Delay => "delay",
            QosTarget::Jitter => "jitter",
        }
    }

    /// Whether the readout adds the path propagation delay to the queueing estimate
    pub fn includes_propagation(&self) -> bool {
        matches!(self, QosTarget::Delay)
    }
}

impl FromStr for QosTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "delay" => Ok(QosTarget::Delay),
            "jitter" => Ok(QosTarget::Jitter),
            other => Err(Error::UnsupportedTarget(other.to_string())),
        }
    }
}

impl fmt::Display for QosTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
