//! Synthetic training ladders for smoke runs
//!
//! Every ladder entry draws flow traffic from a uniform band whose centre moves
//! by `shift_per_entry` from one entry to the next, so consecutive entries form a
//! distribution shift the drift detector can observe. Labels follow a simple
//! M/M/1-style queueing approximation over each flow's path.

use super::reader::{write_split, Split};
use super::sample::{FlowFeatures, Sample};
use crate::config::{QosTarget, Topology};
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Highest link utilisation used when computing queueing delay
const MAX_UTILISATION: f32 = 0.95;

/// Parameters of the synthetic generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Windows in the training split of every entry
    pub training_windows: usize,
    /// Windows in the validation split of every entry
    pub validation_windows: usize,
    /// Windows in the testing split of every entry
    pub testing_windows: usize,
    /// Flows per window
    pub flows: usize,
    /// Links in the topology
    pub links: usize,
    /// Longest flow path in links
    pub max_path_len: usize,
    /// Centre of the traffic band of entry 0
    pub base_traffic: f32,
    /// Half-width of the traffic band
    pub traffic_spread: f32,
    /// Increase of the band centre per ladder entry
    pub shift_per_entry: f32,
    /// Per-flow delay budget written when set
    pub delay_budget: Option<f32>,
    pub seed: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            training_windows: 40,
            validation_windows: 10,
            testing_windows: 50,
            flows: 10,
            links: 6,
            max_path_len: 3,
            base_traffic: 100.0,
            traffic_spread: 40.0,
            shift_per_entry: 150.0,
            delay_budget: None,
            seed: 42,
        }
    }
}

impl SynthConfig {
    pub fn validate(&self) -> Result<()> {
        if self.flows == 0 || self.links == 0 {
            return Err(Error::ConfigError("synthetic topology needs flows and links".to_string()));
        }
        if self.max_path_len == 0 || self.max_path_len > self.links {
            return Err(Error::ConfigError(format!(
                "max_path_len must be in 1..={} (got {})",
                self.links, self.max_path_len
            )));
        }
        if self.training_windows == 0 || self.validation_windows == 0 || self.testing_windows == 0 {
            return Err(Error::ConfigError("every split needs at least one window".to_string()));
        }
        if !(self.traffic_spread >= 0.0 && self.traffic_spread < self.base_traffic) {
            return Err(Error::ConfigError(
                "traffic_spread must be non-negative and below base_traffic".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generator of synthetic windows with a fixed topology
pub struct SyntheticLadder {
    config: SynthConfig,
    target: QosTarget,
    capacities: Vec<f32>,
    propagation: Vec<f32>,
    paths: Vec<Vec<usize>>,
    rng: StdRng,
}

impl SyntheticLadder {
    /// Draw the topology (capacities, paths) from the configured seed
    pub fn new(config: SynthConfig, target: QosTarget) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);

        // Capacity scales with the load of a whole band so utilisation stays moderate.
        let peak = config.base_traffic * config.flows as f32;
        let capacities: Vec<f32> =
            (0..config.links).map(|_| peak * rng.random_range(2.0..4.0)).collect();
        let propagation: Vec<f32> = (0..config.links).map(|_| rng.random_range(0.001..0.005)).collect();

        let paths = (0..config.flows)
            .map(|_| {
                let len = rng.random_range(1..=config.max_path_len);
                let start = rng.random_range(0..config.links);
                (0..len).map(|hop| (start + hop) % config.links).collect()
            })
            .collect();

        Ok(Self { config, target, capacities, propagation, paths, rng })
    }

    /// Draw one window from the traffic band of a ladder entry
    pub fn window(&mut self, entry: usize) -> Sample {
        let cfg = &self.config;
        let centre = cfg.base_traffic + cfg.shift_per_entry * entry as f32;
        let n = cfg.flows;

        let flow_traffic: Vec<f32> = (0..n)
            .map(|_| {
                if cfg.traffic_spread > 0.0 {
                    self.rng.random_range(centre - cfg.traffic_spread..centre + cfg.traffic_spread)
                } else {
                    centre
                }
            })
            .collect();
        let flow_packet_size: Vec<f32> = (0..n).map(|_| self.rng.random_range(500.0..1500.0)).collect();
        let flow_length: Vec<f32> = flow_traffic.iter().map(|t| (t / 10.0).round().max(1.0)).collect();

        let mut link_load = vec![0.0f32; cfg.links];
        for (flow, path) in self.paths.iter().enumerate() {
            for &link in path {
                link_load[link] += flow_traffic[flow];
            }
        }

        let mut labels = Vec::with_capacity(n);
        let mut flow_propag_delay = Vec::with_capacity(n);
        for (flow, path) in self.paths.iter().enumerate() {
            let propag: f32 = path.iter().map(|&l| self.propagation[l]).sum();
            let queueing: f32 = path
                .iter()
                .map(|&l| {
                    let rho = (link_load[l] / self.capacities[l]).min(MAX_UTILISATION);
                    flow_packet_size[flow] / (self.capacities[l] * (1.0 - rho))
                })
                .sum();
            flow_propag_delay.push(propag);
            labels.push(match self.target {
                QosTarget::Delay => propag + queueing,
                QosTarget::Jitter => 0.5 * queueing,
            });
        }

        Sample {
            features: FlowFeatures {
                flow_traffic,
                flow_length,
                flow_loss_packet: vec![0.0; n],
                flow_propag_delay,
                flow_packet_size,
                link_capacity: self.capacities.clone(),
                flow_to_link: self.paths.clone(),
                flow_delay_budget: cfg.delay_budget.map(|b| vec![b; n]),
            },
            labels,
        }
    }

    /// Write the three splits of one ladder entry into `dir`
    pub fn write_entry(&mut self, dir: &Path, entry: usize) -> Result<()> {
        let counts = [
            (Split::Training, self.config.training_windows),
            (Split::Validation, self.config.validation_windows),
            (Split::Testing, self.config.testing_windows),
        ];
        for (split, count) in counts {
            let windows: Vec<Sample> = (0..count).map(|_| self.window(entry)).collect();
            write_split(split.path_in(dir), &windows)?;
        }
        Ok(())
    }

    /// Write a whole ladder using a topology's directory convention
    pub fn write_ladder(&mut self, data_root: &Path, topology: Topology, suffixes: &[u32]) -> Result<Vec<PathBuf>> {
        let mut dirs = Vec::with_capacity(suffixes.len());
        for (entry, &suffix) in suffixes.iter().enumerate() {
            let dir = topology.dataset_dir(data_root, suffix);
            self.write_entry(&dir, entry)?;
            tracing::info!(entry, dir = %dir.display(), "wrote synthetic dataset");
            dirs.push(dir);
        }
        Ok(dirs)
    }
}
