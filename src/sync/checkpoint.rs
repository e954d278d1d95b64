//! Read side of the checkpoint directory

use super::state::ModelVersion;
use crate::config::QosTarget;
use crate::data::{load_split, NormalizationTable, Split, TrainingLadder};
use crate::error::{Error, Result};
use crate::model::VirtualTwin;
use crate::train::{manifest_path, read_checkpoint, weights_path};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// `{root}/model_version_{v}/{target}_final_weight`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointLayout {
    root: PathBuf,
}

impl CheckpointLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version_dir(&self, version: ModelVersion) -> PathBuf {
        self.root.join(format!("model_version_{}", version.index()))
    }

    pub fn weights(&self, version: ModelVersion, target: QosTarget) -> PathBuf {
        weights_path(&self.version_dir(version), target)
    }
}

/// Checkpoints as the synchronization loop sees them
///
/// The loop never writes checkpoints; it only asks when one was last modified
/// and loads it once it is fresh.
pub trait CheckpointStore {
    /// Modification time of a version's weights, `None` if absent
    fn modified(&self, version: ModelVersion) -> Option<SystemTime>;

    /// Whether the trainer left a completion manifest for the version
    fn is_complete(&self, version: ModelVersion) -> bool;

    /// Load a version into a fresh twin ready to predict
    fn load(&self, version: ModelVersion) -> Result<VirtualTwin>;
}

/// Checkpoint store over the filesystem layout
///
/// Loading re-derives the normalization table from the training split of the
/// ladder entry that produced the version.
#[derive(Debug, Clone)]
pub struct FsCheckpointStore {
    layout: CheckpointLayout,
    target: QosTarget,
    ladder: TrainingLadder,
}

impl FsCheckpointStore {
    pub fn new(layout: CheckpointLayout, target: QosTarget, ladder: TrainingLadder) -> Self {
        Self { layout, target, ladder }
    }

    pub fn layout(&self) -> &CheckpointLayout {
        &self.layout
    }
}

impl CheckpointStore for FsCheckpointStore {
    fn modified(&self, version: ModelVersion) -> Option<SystemTime> {
        std::fs::metadata(self.layout.weights(version, self.target))
            .and_then(|m| m.modified())
            .ok()
    }

    fn is_complete(&self, version: ModelVersion) -> bool {
        manifest_path(&self.layout.weights(version, self.target)).is_file()
    }

    fn load(&self, version: ModelVersion) -> Result<VirtualTwin> {
        let path = self.layout.weights(version, self.target);
        let checkpoint = read_checkpoint(&path)?;
        if checkpoint.target != self.target {
            return Err(Error::checkpoint(
                &path,
                format!("trained for {}, expected {}", checkpoint.target.as_str(), self.target.as_str()),
            ));
        }
        let dataset = self.ladder.get(version.index()).ok_or_else(|| {
            Error::checkpoint(&path, format!("no ladder entry for {version}"))
        })?;

        let training = load_split(dataset, Split::Training)?;
        let mut twin = VirtualTwin::from_weights(self.target, checkpoint.weights)?;
        twin.set_normalization(NormalizationTable::fit(&training)?);
        Ok(twin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{write_split, Sample};
    use crate::data::fixtures::tiny_sample;
    use crate::model::{CheckpointFile, TwinWeights, INPUT_DIM};
    use crate::train::{write_checkpoint, write_manifest, ReadyManifest};
    use tempfile::TempDir;

    fn setup() -> (TempDir, FsCheckpointStore) {
        let tmp = TempDir::new().unwrap();
        let dataset = tmp.path().join("data/experiment_100_cv");
        let windows: Vec<Sample> = vec![tiny_sample(&[1.0, 2.0]), tiny_sample(&[3.0, 4.0])];
        write_split(Split::Training.path_in(&dataset), &windows).unwrap();
        let ladder = TrainingLadder::new(vec![dataset]).unwrap();
        let store = FsCheckpointStore::new(CheckpointLayout::new(tmp.path().join("weights")), QosTarget::Delay, ladder);
        (tmp, store)
    }

    fn write(store: &FsCheckpointStore, version: ModelVersion, target: QosTarget) -> PathBuf {
        let path = store.layout().weights(version, QosTarget::Delay);
        let file = CheckpointFile { target, epoch: 1, weights: TwinWeights::init(INPUT_DIM, 4, 0) };
        write_checkpoint(&path, &file).unwrap();
        path
    }

    #[test]
    fn test_layout_paths() {
        let layout = CheckpointLayout::new("/ckpt");
        assert_eq!(
            layout.weights(ModelVersion(3), QosTarget::Jitter),
            PathBuf::from("/ckpt/model_version_3/jitter_final_weight")
        );
    }

    #[test]
    fn test_missing_checkpoint_has_no_mtime() {
        let (_tmp, store) = setup();
        assert!(store.modified(ModelVersion(0)).is_none());
        assert!(!store.is_complete(ModelVersion(0)));
    }

    #[test]
    fn test_load_installs_normalization() {
        let (_tmp, store) = setup();
        let path = write(&store, ModelVersion(0), QosTarget::Delay);
        assert!(store.modified(ModelVersion(0)).is_some());

        let twin = store.load(ModelVersion(0)).unwrap();
        assert!(twin.normalization().is_some());
        assert_eq!(twin.predict(&tiny_sample(&[1.0, 2.0]).features).unwrap().len(), 2);

        assert!(!store.is_complete(ModelVersion(0)));
        let manifest = ReadyManifest {
            target: QosTarget::Delay,
            epochs_run: 1,
            best_val_loss: None,
            finished_at: chrono::Utc::now(),
        };
        write_manifest(&path, &manifest).unwrap();
        assert!(store.is_complete(ModelVersion(0)));
    }

    #[test]
    fn test_wrong_target_rejected() {
        let (_tmp, store) = setup();
        write(&store, ModelVersion(0), QosTarget::Jitter);
        assert!(matches!(store.load(ModelVersion(0)), Err(Error::Checkpoint { .. })));
    }

    #[test]
    fn test_version_outside_ladder_rejected() {
        let (_tmp, store) = setup();
        write(&store, ModelVersion(1), QosTarget::Delay);
        assert!(store.load(ModelVersion(1)).is_err());
    }
}
