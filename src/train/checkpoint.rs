//! Checkpoint files written by the trainer
//!
//! Weights are written atomically (temporary file, then rename) so a reader
//! never observes a half-written checkpoint. A `.ready` manifest next to the
//! weights marks a run that finished its final epoch.

use crate::config::QosTarget;
use crate::error::{Error, Result};
use crate::model::CheckpointFile;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Weights file of one target inside a checkpoint directory
pub fn weights_path(dir: &Path, target: QosTarget) -> PathBuf {
    dir.join(format!("{}_final_weight", target.as_str()))
}

/// Manifest marking a completed training run
pub fn manifest_path(weights: &Path) -> PathBuf {
    let mut name = weights.as_os_str().to_os_string();
    name.push(".ready");
    PathBuf::from(name)
}

/// Summary written once fitting has finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyManifest {
    pub target: QosTarget,
    pub epochs_run: usize,
    pub best_val_loss: Option<f32>,
    pub finished_at: DateTime<Utc>,
}

/// Serialize `value` as JSON into `path` through a sibling temporary file
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    fs::create_dir_all(parent)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::checkpoint(path, "path has no file name"))?
        .to_string_lossy();
    let tmp = parent.join(format!(".{file_name}.tmp"));
    let data = serde_json::to_vec(value)?;
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read(path).map_err(|e| Error::checkpoint(path, format!("cannot read: {e}")))?;
    serde_json::from_slice(&data).map_err(|e| Error::checkpoint(path, format!("malformed: {e}")))
}

/// Write a weights checkpoint
pub fn write_checkpoint(path: &Path, checkpoint: &CheckpointFile) -> Result<()> {
    write_json_atomic(path, checkpoint)
}

/// Read and validate a weights checkpoint
pub fn read_checkpoint(path: &Path) -> Result<CheckpointFile> {
    let checkpoint: CheckpointFile = read_json(path)?;
    checkpoint
        .weights
        .validate()
        .map_err(|e| Error::checkpoint(path, e.to_string()))?;
    Ok(checkpoint)
}

/// Write the `.ready` manifest next to a weights file
pub fn write_manifest(weights: &Path, manifest: &ReadyManifest) -> Result<()> {
    write_json_atomic(&manifest_path(weights), manifest)
}

/// Remove the manifest of a weights file, if any
pub fn clear_manifest(weights: &Path) -> Result<()> {
    match fs::remove_file(manifest_path(weights)) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Read the manifest of a weights file
pub fn read_manifest(weights: &Path) -> Result<ReadyManifest> {
    read_json(&manifest_path(weights))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TwinWeights;
    use tempfile::TempDir;

    fn checkpoint(epoch: usize) -> CheckpointFile {
        CheckpointFile { target: QosTarget::Delay, epoch, weights: TwinWeights::init(9, 4, 1) }
    }

    #[test]
    fn test_paths() {
        let w = weights_path(Path::new("/w/model_version_2"), QosTarget::Jitter);
        assert_eq!(w, PathBuf::from("/w/model_version_2/jitter_final_weight"));
        assert_eq!(manifest_path(&w), PathBuf::from("/w/model_version_2/jitter_final_weight.ready"));
    }

    #[test]
    fn test_write_read_and_overwrite() {
        let tmp = TempDir::new().unwrap();
        let path = weights_path(&tmp.path().join("model_version_0"), QosTarget::Delay);
        write_checkpoint(&path, &checkpoint(1)).unwrap();
        write_checkpoint(&path, &checkpoint(2)).unwrap();
        assert_eq!(read_checkpoint(&path).unwrap().epoch, 2);
        // no temporary file left behind
        let entries = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_corrupt_checkpoint_is_checkpoint_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("delay_final_weight");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(matches!(read_checkpoint(&path), Err(Error::Checkpoint { .. })));
    }

    #[test]
    fn test_manifest_round_trip() {
        let tmp = TempDir::new().unwrap();
        let weights = tmp.path().join("delay_final_weight");
        let manifest = ReadyManifest {
            target: QosTarget::Delay,
            epochs_run: 7,
            best_val_loss: Some(3.5),
            finished_at: Utc::now(),
        };
        write_manifest(&weights, &manifest).unwrap();
        assert_eq!(read_manifest(&weights).unwrap(), manifest);
    }
}
