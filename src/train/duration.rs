//! Wall-clock training duration log

use super::checkpoint::write_json_atomic;
use crate::config::{QosTarget, Topology};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// JSON array of training durations in seconds, one file per
/// topology, target and realization
///
/// Appending reads the existing array, pushes and rewrites the file. Callers
/// serialize writers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationLog {
    path: PathBuf,
}

impl DurationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `{results}/{topology}/training_time_{topology}_{target}_r_{r}.json`
    pub fn for_run(results_dir: &Path, topology: Topology, target: QosTarget, realization: usize) -> Self {
        Self::new(results_dir.join(topology.as_str()).join(format!(
            "training_time_{}_{}_r_{}.json",
            topology.as_str(),
            target.as_str(),
            realization
        )))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recorded durations; empty when the log does not exist yet
    pub fn read(&self) -> Result<Vec<f64>> {
        match std::fs::read(&self.path) {
            Ok(data) => serde_json::from_slice(&data)
                .map_err(|e| Error::Serialization(format!("{}: {e}", self.path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Append one duration
    pub fn append(&self, secs: f64) -> Result<()> {
        let mut durations = self.read()?;
        durations.push(secs);
        write_json_atomic(&self.path, &durations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let log = DurationLog::for_run(Path::new("results"), Topology::Passion, QosTarget::Delay, 3);
        assert_eq!(log.path(), Path::new("results/passion/training_time_passion_delay_r_3.json"));
    }

    #[test]
    fn test_append_accumulates() {
        let tmp = TempDir::new().unwrap();
        let log = DurationLog::for_run(tmp.path(), Topology::Germany, QosTarget::Jitter, 0);
        assert!(log.read().unwrap().is_empty());
        log.append(1.5).unwrap();
        log.append(2.25).unwrap();
        assert_eq!(log.read().unwrap(), vec![1.5, 2.25]);
    }
}
