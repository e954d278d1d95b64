//! Mean / inverse-std normalization fitted on a training split

use super::sample::{FlowFeatures, Sample};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fields the twin normalizes before embedding
pub const NORMALIZED_FIELDS: [&str; 5] = [
    "flow_traffic",
    "flow_length",
    "flow_loss_packet",
    "flow_propag_delay",
    "link_capacity",
];

/// Mean and scale of one field; normalized value is `(x - mean) * scale`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub mean: f32,
    /// `1 / std`, or `0` when the field is constant
    pub scale: f32,
}

impl FieldStats {
    /// Apply the transform to one value
    #[inline]
    pub fn apply(&self, x: f32) -> f32 {
        (x - self.mean) * self.scale
    }
}

/// Running mean/variance (Welford) used while streaming a split
#[derive(Debug, Clone, Copy, Default)]
struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    fn finish(&self) -> FieldStats {
        let var = if self.count > 0 { self.m2 / self.count as f64 } else { 0.0 };
        let std = var.sqrt();
        let scale = if std > 0.0 { 1.0 / std } else { 0.0 };
        FieldStats { mean: self.mean as f32, scale: scale as f32 }
    }
}

/// Per-field normalization table required before the twin can predict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationTable {
    fields: BTreeMap<String, FieldStats>,
}

impl NormalizationTable {
    /// Build a table from explicit statistics
    pub fn from_fields(fields: impl IntoIterator<Item = (String, FieldStats)>) -> Result<Self> {
        let table = Self { fields: fields.into_iter().collect() };
        table.validate()?;
        Ok(table)
    }

    /// Fit the table over every window of a training corpus
    pub fn fit<'a>(samples: impl IntoIterator<Item = &'a Sample>) -> Result<Self> {
        let mut running: BTreeMap<&'static str, RunningStats> =
            NORMALIZED_FIELDS.iter().map(|&f| (f, RunningStats::default())).collect();

        let mut windows = 0usize;
        for sample in samples {
            windows += 1;
            for (&name, stats) in running.iter_mut() {
                if let Some(values) = sample.features.field(name) {
                    values.iter().for_each(|&v| stats.push(f64::from(v)));
                }
            }
        }
        if windows == 0 {
            return Err(Error::ConfigError("cannot fit normalization on an empty corpus".to_string()));
        }

        Ok(Self {
            fields: running.into_iter().map(|(k, v)| (k.to_string(), v.finish())).collect(),
        })
    }

    /// Ensure every normalized field is present
    pub fn validate(&self) -> Result<()> {
        for field in NORMALIZED_FIELDS {
            if !self.fields.contains_key(field) {
                return Err(Error::ConfigError(format!(
                    "normalization table is missing field '{field}'"
                )));
            }
        }
        Ok(())
    }

    /// Statistics of one field
    pub fn get(&self, field: &str) -> Option<FieldStats> {
        self.fields.get(field).copied()
    }

    /// Normalize a field of a window
    pub fn normalize(&self, features: &FlowFeatures, field: &str) -> Result<Vec<f32>> {
        let stats = self
            .get(field)
            .ok_or_else(|| Error::ConfigError(format!("no statistics for field '{field}'")))?;
        let values = features
            .field(field)
            .ok_or_else(|| Error::ConfigError(format!("unknown feature field '{field}'")))?;
        Ok(values.iter().map(|&v| stats.apply(v)).collect())
    }
}
