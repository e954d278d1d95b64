//! The synchronization loop

use super::accumulator::{ErrorOnly, WindowAccumulator};
use super::action::DriftAction;
use super::checkpoint::CheckpointStore;
use super::config::SyncConfig;
use super::job::{JobExit, JobLauncher, RetrainRequest};
use super::metrics::SyncMetrics;
use super::pacing::{NoPacing, Pacer};
use super::state::{InFlight, ModelVersion, SyncState};
use crate::data::{Sample, TrainingLadder};
use crate::drift::{ConceptDriftDetector, DriftSignal};
use crate::error::Result;
use crate::model::VirtualTwin;
use std::time::SystemTime;

/// Counters describing what a run did
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub windows: usize,
    pub flows: u64,
    /// Drift alarms recorded while idle, at most one per window
    pub drifts: usize,
    /// Drift alarms ignored because a job was running
    pub suppressed_drifts: usize,
    /// Jobs spawned; each one answers a distinct recorded drift, so this
    /// never exceeds `drifts`
    pub spawns: usize,
    pub completed_jobs: usize,
    pub rejected_jobs: usize,
    pub swaps: usize,
    pub swap_failures: usize,
    /// Drifts that found no further ladder entry
    pub exhausted: usize,
}

/// Result of a finished run
#[derive(Clone, Debug)]
pub struct SyncReport {
    pub metrics: SyncMetrics,
    pub stats: SyncStats,
    /// Version active when the stream ended
    pub active_version: ModelVersion,
}

/// Streams windows through the active twin, watches for drift and keeps the
/// twin in sync with the retrained checkpoints
///
/// Per window:
/// 1. swap in the pending checkpoint if it is fresh and no job is running
/// 2. predict every flow and record the window metrics
/// 3. feed the detector, spawn a job on drift, pace, poll the job
///
/// Dropping the loop kills an outstanding job without waiting for it.
pub struct SyncLoop {
    config: SyncConfig,
    ladder: TrainingLadder,
    store: Box<dyn CheckpointStore>,
    launcher: Box<dyn JobLauncher>,
    detector: Box<dyn ConceptDriftDetector>,
    pacer: Box<dyn Pacer>,
    accumulator: Box<dyn WindowAccumulator>,
    active: VirtualTwin,
    active_version: ModelVersion,
    pending_version: ModelVersion,
    state: SyncState,
    last_swap: Option<SystemTime>,
    consecutive_swap_failures: usize,
    metrics: SyncMetrics,
    stats: SyncStats,
    last_action: Option<DriftAction>,
}

impl SyncLoop {
    /// Loop starting from version 0, which `active` must already hold
    pub fn new(
        config: SyncConfig,
        ladder: TrainingLadder,
        active: VirtualTwin,
        store: Box<dyn CheckpointStore>,
        launcher: Box<dyn JobLauncher>,
        detector: Box<dyn ConceptDriftDetector>,
    ) -> Result<Self> {
        config.validate()?;
        let last_swap = store.modified(ModelVersion::default());
        Ok(Self {
            config,
            ladder,
            store,
            launcher,
            detector,
            pacer: Box::new(NoPacing),
            accumulator: Box::new(ErrorOnly),
            active,
            active_version: ModelVersion::default(),
            pending_version: ModelVersion::default(),
            state: SyncState::Idle,
            last_swap,
            consecutive_swap_failures: 0,
            metrics: SyncMetrics::default(),
            stats: SyncStats::default(),
            last_action: None,
        })
    }

    pub fn with_pacer(mut self, pacer: impl Pacer + 'static) -> Self {
        self.pacer = Box::new(pacer);
        self
    }

    pub fn with_accumulator(mut self, accumulator: impl WindowAccumulator + 'static) -> Self {
        self.metrics = accumulator.metrics();
        self.accumulator = Box::new(accumulator);
        self
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn active_version(&self) -> ModelVersion {
        self.active_version
    }

    /// Version the next swap loads
    pub fn pending_version(&self) -> ModelVersion {
        self.pending_version
    }

    pub fn active_model(&self) -> &VirtualTwin {
        &self.active
    }

    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// What the most recent drift alarm led to
    pub fn last_action(&self) -> Option<&DriftAction> {
        self.last_action.as_ref()
    }

    /// Consume the whole stream, then kill any outstanding job
    pub fn run<I>(mut self, stream: I) -> Result<SyncReport>
    where
        I: IntoIterator<Item = Result<Sample>>,
    {
        for sample in stream {
            self.process_window(&sample?)?;
        }
        Ok(self.finish())
    }

    /// Process the next window of the stream
    pub fn process_window(&mut self, sample: &Sample) -> Result<()> {
        let window = self.stats.windows;
        self.maybe_swap(window)?;

        let predictions = self.active.predict(&sample.features)?;
        self.accumulator.record(sample, &predictions, &mut self.metrics)?;
        let nmse = self.metrics.error_per_window.last().copied().unwrap_or(f64::NAN);

        if self.config.signal == DriftSignal::WindowError {
            self.detector.update(nmse);
            if self.detector.drift_detected() {
                self.last_action = Some(self.on_drift(window)?);
            }
        }

        for &traffic in &sample.features.flow_traffic {
            if self.config.signal == DriftSignal::Traffic {
                self.detector.update(f64::from(traffic));
                if self.detector.drift_detected() {
                    self.last_action = Some(self.on_drift(window)?);
                }
            }
            self.stats.flows += 1;
            self.pacer.pace(self.stats.flows, self.state.is_retraining());
            self.poll_job();
        }

        tracing::info!(
            window,
            nmse_db = nmse,
            active = %self.active_version,
            state = ?self.state,
            "window processed"
        );
        self.stats.windows += 1;
        Ok(())
    }

    /// Kill any outstanding job and hand back the metrics
    pub fn finish(mut self) -> SyncReport {
        self.kill_outstanding();
        SyncReport {
            metrics: std::mem::take(&mut self.metrics),
            stats: self.stats.clone(),
            active_version: self.active_version,
        }
    }

    fn maybe_swap(&mut self, window: usize) -> Result<()> {
        if !self.config.sync_enabled || self.state.is_retraining() {
            return Ok(());
        }
        let Some(mtime) = self.store.modified(self.pending_version) else {
            return Ok(());
        };
        if self.last_swap.is_some_and(|last| mtime <= last) {
            return Ok(());
        }

        match self.store.load(self.pending_version) {
            Ok(twin) => {
                tracing::info!(window, from = %self.active_version, to = %self.pending_version, "swapped model");
                self.active = twin;
                self.active_version = self.pending_version;
                self.last_swap = Some(mtime);
                self.consecutive_swap_failures = 0;
                self.metrics.record_update(window);
                self.stats.swaps += 1;
                Ok(())
            }
            Err(e) => {
                self.consecutive_swap_failures += 1;
                self.stats.swap_failures += 1;
                if self.consecutive_swap_failures >= self.config.max_swap_failures {
                    tracing::error!(window, version = %self.pending_version, error = %e, "giving up on checkpoint");
                    return Err(e);
                }
                tracing::warn!(
                    window,
                    version = %self.pending_version,
                    attempt = self.consecutive_swap_failures,
                    error = %e,
                    "checkpoint load failed, retrying next window"
                );
                Ok(())
            }
        }
    }

    fn on_drift(&mut self, window: usize) -> Result<DriftAction> {
        if self.state.is_retraining() {
            self.stats.suppressed_drifts += 1;
            tracing::debug!(window, "drift ignored while retraining");
            return Ok(DriftAction::None);
        }

        if !self.metrics.record_drift(window) {
            // this window's drift was already acted on
            return Ok(DriftAction::None);
        }
        self.stats.drifts += 1;
        if let Some(result) = self.detector.last_result() {
            tracing::info!(
                window,
                detector = self.detector.name(),
                statistic = result.statistic,
                p_value = result.p_value,
                "drift detected"
            );
        }

        if !self.config.sync_enabled {
            return Ok(DriftAction::DriftLogged);
        }
        if !self.ladder.has_successor(self.pending_version.index()) {
            self.stats.exhausted += 1;
            tracing::warn!(window, version = %self.pending_version, "training ladder exhausted, not retraining");
            return Ok(DriftAction::LadderExhausted);
        }

        let version = self.pending_version.next();
        let Some(dataset_dir) = self.ladder.get(version.index()) else {
            return Ok(DriftAction::LadderExhausted);
        };
        let request = RetrainRequest { version, dataset_dir: dataset_dir.to_path_buf() };
        let job = self.launcher.spawn(&request)?;

        tracing::info!(window, %version, dataset = %request.dataset_dir.display(), "retraining started");
        self.pending_version = version;
        self.state = SyncState::Retraining(InFlight { version, job, spawned_at: window });
        self.stats.spawns += 1;
        Ok(DriftAction::RetrainTriggered(version))
    }

    fn poll_job(&mut self) {
        let (version, exit) = match &mut self.state {
            SyncState::Retraining(inflight) => match inflight.job.poll() {
                Some(exit) => (inflight.version, exit),
                None => return,
            },
            SyncState::Idle => return,
        };
        self.state = SyncState::Idle;

        let manifest = self.store.is_complete(version);
        if self.config.completion.accepts(&exit, manifest) {
            self.stats.completed_jobs += 1;
            tracing::info!(%version, ?exit, "retraining finished");
        } else {
            self.stats.rejected_jobs += 1;
            self.pending_version = self.active_version;
            tracing::warn!(
                %version,
                ?exit,
                manifest,
                policy = ?self.config.completion,
                "retraining result rejected"
            );
        }
        if let JobExit::Failed(code) = exit {
            tracing::debug!(%version, ?code, "retraining job failed");
        }
    }

    fn kill_outstanding(&mut self) {
        if let SyncState::Retraining(mut inflight) = std::mem::take(&mut self.state) {
            tracing::info!(version = %inflight.version, "killing outstanding retraining job");
            inflight.job.kill();
        }
    }
}

impl Drop for SyncLoop {
    fn drop(&mut self) {
        self.kill_outstanding();
    }
}
