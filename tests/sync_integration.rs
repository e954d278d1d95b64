//! End-to-end synchronization over a synthetic ladder with a real checkpoint
//! directory and in-process retraining

use std::thread;
use std::time::Duration;

use gemelo::config::{QosTarget, Topology};
use gemelo::data::{write_split, ConcatStream, Sample, Split, SynthConfig, SyntheticLadder, TrainingLadder};
use gemelo::drift::{Kswin, KswinConfig};
use gemelo::error::Result;
use gemelo::sync::{
    CheckpointLayout, CheckpointStore, DriftAction, FsCheckpointStore, JobExit, JobLauncher, ModelVersion,
    RetrainJob, RetrainRequest, SyncConfig, SyncLoop, SyncReport, ThreadLauncher,
};
use gemelo::model::VirtualTwin;
use gemelo::train::{train_and_evaluate, TrainConfig, TrainOutputs};
use tempfile::TempDir;

/// Windows streamed before the traffic shift
const SHIFT_AT: usize = 200;
const WINDOWS: usize = 500;
const FLOWS: usize = 10;

fn quick_training() -> TrainConfig {
    TrainConfig { epochs: 2, hidden_dim: 8, ..TrainConfig::default() }
}

fn detector() -> Box<Kswin> {
    let config = KswinConfig { alpha: 1e-6, window_size: 300, stat_size: 60, ..KswinConfig::default() };
    Box::new(Kswin::new(config).expect("detector config should be valid"))
}

/// Waits for the wrapped job inside `spawn`, so the checkpoint is on disk
/// before the loop sees the job
struct CompletingLauncher(ThreadLauncher);

struct Finished(JobExit);

impl RetrainJob for Finished {
    fn poll(&mut self) -> Option<JobExit> {
        Some(self.0)
    }

    fn kill(&mut self) {}
}

impl JobLauncher for CompletingLauncher {
    fn spawn(&mut self, request: &RetrainRequest) -> Result<Box<dyn RetrainJob>> {
        let mut job = self.0.spawn(request)?;
        loop {
            if let Some(exit) = job.poll() {
                return Ok(Box::new(Finished(exit)));
            }
            thread::sleep(Duration::from_millis(5));
        }
    }
}

struct Fixture {
    _tmp: TempDir,
    ladder: TrainingLadder,
    layout: CheckpointLayout,
}

fn fixture() -> Fixture {
    let tmp = TempDir::new().expect("temp file creation should succeed");
    let data_root = tmp.path().join("data");
    let synth = SynthConfig { training_windows: 20, validation_windows: 5, flows: FLOWS, ..SynthConfig::default() };
    let mut generator = SyntheticLadder::new(synth, QosTarget::Delay).expect("synthetic config should be valid");
    let dirs = generator
        .write_ladder(&data_root, Topology::Germany, &[0, 1])
        .expect("ladder should be written");

    // Testing stream: SHIFT_AT windows of entry 0, then the shifted entry 1.
    for (entry, count) in [(0, SHIFT_AT), (1, WINDOWS - SHIFT_AT)] {
        let windows: Vec<Sample> = (0..count).map(|_| generator.window(entry)).collect();
        write_split(Split::Testing.path_in(&dirs[entry]), &windows).expect("testing split should be written");
    }
    let ladder = TrainingLadder::new(dirs).expect("ladder should be non-empty");
    let layout = CheckpointLayout::new(tmp.path().join("weights").join("germany"));
    Fixture { _tmp: tmp, ladder, layout }
}

fn bootstrap(fx: &Fixture) {
    let outputs = TrainOutputs {
        checkpoint: Some(fx.layout.weights(ModelVersion(0), QosTarget::Delay)),
        ..TrainOutputs::default()
    };
    let config = quick_training();
    train_and_evaluate(
        fx.ladder.get(0).expect("entry 0 exists"),
        || VirtualTwin::untrained(QosTarget::Delay, config.hidden_dim, config.seed),
        &config,
        &outputs,
    )
    .expect("initial training should succeed");
}

fn run(fx: &Fixture, sync_enabled: bool) -> SyncReport {
    let store = FsCheckpointStore::new(fx.layout.clone(), QosTarget::Delay, fx.ladder.clone());
    let active = store.load(ModelVersion(0)).expect("v0 should load");
    let launcher = CompletingLauncher(ThreadLauncher::new(fx.layout.clone(), QosTarget::Delay, quick_training()));
    let config = SyncConfig { sync_enabled, ..SyncConfig::default() };

    SyncLoop::new(config, fx.ladder.clone(), active, Box::new(store), Box::new(launcher), detector())
        .expect("loop should build")
        .run(ConcatStream::new(fx.ladder.testing_splits()))
        .expect("run should succeed")
}

fn weights_exist(layout: &CheckpointLayout, version: usize) -> bool {
    layout.weights(ModelVersion(version), QosTarget::Delay).is_file()
}

#[test]
fn test_shift_triggers_one_retrain_and_one_swap() {
    let fx = fixture();
    bootstrap(&fx);

    let report = run(&fx, true);

    assert_eq!(report.metrics.error_per_window.len(), WINDOWS);
    assert_eq!(report.stats.flows, (WINDOWS * FLOWS) as u64);

    assert_eq!(report.metrics.drift_detected.len(), 1);
    let drift = report.metrics.drift_detected[0];
    assert!(drift.abs_diff(SHIFT_AT) <= 50, "drift at window {drift}");

    assert_eq!(report.stats.spawns, 1);
    assert_eq!(report.stats.completed_jobs, 1);
    assert_eq!(report.stats.swaps, 1);
    assert_eq!(report.active_version, ModelVersion(1));
    assert_eq!(report.metrics.model_updated.len(), 1);
    assert!(report.metrics.model_updated[0] > drift);
    assert!(weights_exist(&fx.layout, 1));
}

#[test]
fn test_disabled_sync_only_logs_drift() {
    let fx = fixture();
    bootstrap(&fx);

    let report = run(&fx, false);

    assert_eq!(report.metrics.drift_detected.len(), 1);
    assert!(report.metrics.model_updated.is_empty());
    assert_eq!(report.stats.spawns, 0);
    assert_eq!(report.active_version, ModelVersion(0));
    assert!(!weights_exist(&fx.layout, 1));
}

#[test]
fn test_baseline_runs_are_reproducible() {
    let fx = fixture();
    bootstrap(&fx);

    let first = run(&fx, false);
    let second = run(&fx, false);

    assert_eq!(first.metrics.drift_detected, second.metrics.drift_detected);
    assert_eq!(first.metrics.error_per_window, second.metrics.error_per_window);
}

#[test]
fn test_last_drift_action_reports_spawn() {
    let fx = fixture();
    bootstrap(&fx);

    let store = FsCheckpointStore::new(fx.layout.clone(), QosTarget::Delay, fx.ladder.clone());
    let active = store.load(ModelVersion(0)).expect("v0 should load");
    let launcher = CompletingLauncher(ThreadLauncher::new(fx.layout.clone(), QosTarget::Delay, quick_training()));
    let mut sync = SyncLoop::new(
        SyncConfig::default(),
        fx.ladder.clone(),
        active,
        Box::new(store),
        Box::new(launcher),
        detector(),
    )
    .expect("loop should build");

    for sample in ConcatStream::new(fx.ladder.testing_splits()) {
        sync.process_window(&sample.expect("window should parse")).expect("window should process");
        if sync.last_action().is_some() {
            break;
        }
    }
    assert_eq!(sync.last_action(), Some(&DriftAction::RetrainTriggered(ModelVersion(1))));
    assert_eq!(sync.pending_version(), ModelVersion(1));
}
