//! Training-data ladder: one dataset directory per model version

use super::reader::Split;
use crate::config::Topology;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Ordered list of dataset directories; entry `v` trains model version `v`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingLadder {
    entries: Vec<PathBuf>,
}

impl TrainingLadder {
    /// Build a ladder from explicit directories
    pub fn new(entries: Vec<PathBuf>) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::ConfigError("training ladder needs at least one dataset".to_string()));
        }
        Ok(Self { entries })
    }

    /// Conventional ladder for a topology: `{root}/{topology}/{dataset}{suffix}_cv`
    pub fn for_topology(data_root: &Path, topology: Topology, suffixes: &[u32]) -> Result<Self> {
        Self::new(suffixes.iter().map(|&s| topology.dataset_dir(data_root, s)).collect())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ladder has no entries (never true once constructed)
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dataset directory that trains the given version
    pub fn get(&self, version: usize) -> Option<&Path> {
        self.entries.get(version).map(PathBuf::as_path)
    }

    /// Whether a model version beyond `version` can still be trained
    pub fn has_successor(&self, version: usize) -> bool {
        version + 1 < self.entries.len()
    }

    /// Testing splits of every entry, in ladder order
    pub fn testing_splits(&self) -> Vec<PathBuf> {
        self.entries.iter().map(|dir| Split::Testing.path_in(dir)).collect()
    }

    /// All dataset directories
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }
}
