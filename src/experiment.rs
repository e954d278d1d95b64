//! Synchronization experiments
//!
//! One experiment runs `realizations` independent passes over the concatenated
//! testing splits of the ladder. Every pass starts from model version 0
//! (trained first if its checkpoint is missing) and writes its own results file
//! and training-duration log.

use crate::config::{validate_spec, LauncherKind, SyncSpec, Topology};
use crate::data::{ConcatStream, TrainingLadder};
use crate::error::{Error, Result};
use crate::model::VirtualTwin;
use crate::sync::{
    results_path, CheckpointLayout, CheckpointStore, ErrorOnly, FsCheckpointStore, JobLauncher, ModelVersion,
    NoPacing, ProcessLauncher, SlaViolations, SleepPacer, SyncLoop, SyncReport, ThreadLauncher,
};
use crate::train::{train_and_evaluate, DurationLog, TrainOutputs};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of one realization
#[derive(Debug, Clone)]
pub struct RealizationOutcome {
    pub realization: usize,
    /// Results file written for the realization
    pub results: PathBuf,
    /// Whether version 0 had to be trained first
    pub bootstrapped: bool,
    pub report: SyncReport,
}

/// A validated experiment ready to run
#[derive(Debug, Clone)]
pub struct Experiment {
    spec: SyncSpec,
    topology: Topology,
    ladder: TrainingLadder,
    layout: CheckpointLayout,
    config_file: Option<PathBuf>,
}

impl Experiment {
    /// Validate the spec and resolve the ladder; touches no files
    pub fn new(spec: SyncSpec) -> Result<Self> {
        validate_spec(&spec)?;
        let topology = spec.topology()?;
        let ladder = TrainingLadder::for_topology(spec.data_root()?, topology, &spec.data.suffixes)?;
        let layout = CheckpointLayout::new(spec.output.checkpoint_dir.join(topology.as_str()));
        Ok(Self { spec, topology, ladder, layout, config_file: None })
    }

    /// Experiment file handed to retraining processes
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn spec(&self) -> &SyncSpec {
        &self.spec
    }

    pub fn ladder(&self) -> &TrainingLadder {
        &self.ladder
    }

    pub fn layout(&self) -> &CheckpointLayout {
        &self.layout
    }

    pub fn duration_log(&self, realization: usize) -> DurationLog {
        DurationLog::for_run(&self.spec.output.results_dir, self.topology, self.spec.target, realization)
    }

    pub fn results_path(&self, realization: usize) -> PathBuf {
        results_path(
            &self.spec.output.results_dir,
            self.topology,
            self.spec.target,
            self.spec.sync.enabled,
            realization,
            self.spec.sync.sla,
        )
    }

    /// Detector window, which also positions the pacing threshold
    fn window_size(&self) -> usize {
        self.spec.detector.window_size.unwrap_or(self.topology.window_size())
    }

    /// Run every realization in order
    pub fn run(&self) -> Result<Vec<RealizationOutcome>> {
        (0..self.spec.realizations).map(|r| self.run_realization(r)).collect()
    }

    /// Train version 0 from the first ladder entry unless its checkpoint exists
    pub fn bootstrap(&self, realization: usize) -> Result<bool> {
        let target = self.spec.target;
        let weights = self.layout.weights(ModelVersion::default(), target);
        if weights.is_file() {
            return Ok(false);
        }
        let dataset = self
            .ladder
            .get(0)
            .ok_or_else(|| Error::ConfigError("training ladder is empty".to_string()))?;

        tracing::info!(dataset = %dataset.display(), "training the initial model");
        let training = &self.spec.training;
        let outputs = TrainOutputs {
            checkpoint: Some(weights),
            duration_log: Some(self.duration_log(realization)),
            cancel: None,
        };
        train_and_evaluate(
            dataset,
            || VirtualTwin::untrained(target, training.hidden_dim, training.seed),
            training,
            &outputs,
        )?;
        Ok(true)
    }

    fn launcher(&self, realization: usize) -> Result<Box<dyn JobLauncher>> {
        let target = self.spec.target;
        let log = self.duration_log(realization);
        Ok(match self.spec.sync.launcher {
            LauncherKind::Process => {
                let mut launcher = ProcessLauncher::current_exe(self.layout.clone(), target)?
                    .with_duration_log(&log)
                    .with_training(&self.spec.training);
                if let Some(config) = &self.config_file {
                    launcher = launcher.with_config_file(config);
                }
                Box::new(launcher)
            }
            LauncherKind::Thread => Box::new(
                ThreadLauncher::new(self.layout.clone(), target, self.spec.training.clone()).with_duration_log(log),
            ),
        })
    }

    /// Run one realization and persist its metrics
    pub fn run_realization(&self, realization: usize) -> Result<RealizationOutcome> {
        let results = self.results_path(realization);
        create_parent(&results)?;
        fs::create_dir_all(self.layout.root())?;

        let bootstrapped = self.bootstrap(realization)?;

        let store = FsCheckpointStore::new(self.layout.clone(), self.spec.target, self.ladder.clone());
        let active = store.load(ModelVersion::default())?;
        let detector = self.spec.detector.build(self.topology.window_size())?;

        let mut sync = SyncLoop::new(
            self.spec.sync_config(),
            self.ladder.clone(),
            active,
            Box::new(store),
            self.launcher(realization)?,
            detector,
        )?;
        if self.spec.pacing.enabled {
            sync = sync.with_pacer(SleepPacer::for_window(
                self.window_size(),
                self.spec.pacing.margin,
                self.spec.pacing.delay(),
            ));
        } else {
            sync = sync.with_pacer(NoPacing);
        }
        sync = if self.spec.sync.sla { sync.with_accumulator(SlaViolations) } else { sync.with_accumulator(ErrorOnly) };

        tracing::info!(
            realization,
            topology = %self.topology,
            target = %self.spec.target,
            sync = self.spec.sync.enabled,
            entries = self.ladder.len(),
            "starting synchronization run"
        );
        let report = sync.run(ConcatStream::new(self.ladder.testing_splits()))?;
        report.metrics.persist(&results)?;
        tracing::info!(
            realization,
            windows = report.stats.windows,
            drifts = report.stats.drifts,
            swaps = report.stats.swaps,
            results = %results.display(),
            "run finished"
        );

        Ok(RealizationOutcome { realization, results, bootstrapped, report })
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
