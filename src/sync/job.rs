//! Retraining jobs and the launchers that start them
//!
//! A job is polled without blocking; the loop never waits on it. Two launchers
//! exist: [`ProcessLauncher`] re-invokes this binary's `train` subcommand in a
//! child process, [`ThreadLauncher`] trains on a background thread and honours
//! cancellation between steps.

use super::checkpoint::CheckpointLayout;
use super::state::ModelVersion;
use crate::config::QosTarget;
use crate::error::{Error, Result};
use crate::model::VirtualTwin;
use crate::train::{train_and_evaluate, DurationLog, TrainConfig, TrainOutputs};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// One retraining run to start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrainRequest {
    /// Version the run produces
    pub version: ModelVersion,
    /// Ladder entry holding the training and validation splits
    pub dataset_dir: PathBuf,
}

/// How a job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobExit {
    Success,
    /// Failed run, with the process exit code when there was one
    Failed(Option<i32>),
}

impl JobExit {
    pub fn is_success(&self) -> bool {
        matches!(self, JobExit::Success)
    }
}

/// Handle on a running retraining job
pub trait RetrainJob: Send {
    /// Non-blocking completion check; `Some` once the job has exited
    fn poll(&mut self) -> Option<JobExit>;

    /// Stop the job without waiting for it
    fn kill(&mut self);
}

/// Starts retraining jobs
pub trait JobLauncher {
    fn spawn(&mut self, request: &RetrainRequest) -> Result<Box<dyn RetrainJob>>;
}

/// Launches `{program} train ...` as a child process
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: PathBuf,
    layout: CheckpointLayout,
    target: QosTarget,
    config_file: Option<PathBuf>,
    duration_log: Option<PathBuf>,
    training: Option<TrainConfig>,
}

impl ProcessLauncher {
    pub fn new(program: impl Into<PathBuf>, layout: CheckpointLayout, target: QosTarget) -> Self {
        Self { program: program.into(), layout, target, config_file: None, duration_log: None, training: None }
    }

    /// Launcher re-invoking the running executable
    pub fn current_exe(layout: CheckpointLayout, target: QosTarget) -> Result<Self> {
        let exe = std::env::current_exe()
            .map_err(|e| Error::Job(format!("cannot locate current executable: {e}")))?;
        Ok(Self::new(exe, layout, target))
    }

    /// Experiment file forwarded to the child for training hyperparameters
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_duration_log(mut self, log: &DurationLog) -> Self {
        self.duration_log = Some(log.path().to_path_buf());
        self
    }

    /// Forward epochs, learning rate and seed so they win over the experiment file
    pub fn with_training(mut self, config: &TrainConfig) -> Self {
        self.training = Some(config.clone());
        self
    }

    /// Full command line for a request
    pub fn command(&self, request: &RetrainRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--quiet")
            .arg("train")
            .arg("--dataset")
            .arg(&request.dataset_dir)
            .arg("--target")
            .arg(self.target.as_str())
            .arg("--checkpoint")
            .arg(self.layout.weights(request.version, self.target));
        if let Some(config) = &self.config_file {
            cmd.arg("--config").arg(config);
        }
        if let Some(log) = &self.duration_log {
            cmd.arg("--duration-log").arg(log);
        }
        if let Some(training) = &self.training {
            cmd.arg("--epochs")
                .arg(training.epochs.to_string())
                .arg("--lr")
                .arg(training.lr.to_string())
                .arg("--seed")
                .arg(training.seed.to_string());
        }
        cmd.stdin(Stdio::null());
        cmd
    }
}

impl JobLauncher for ProcessLauncher {
    fn spawn(&mut self, request: &RetrainRequest) -> Result<Box<dyn RetrainJob>> {
        let child = self
            .command(request)
            .spawn()
            .map_err(|e| Error::Job(format!("cannot start {}: {e}", self.program.display())))?;
        tracing::info!(pid = child.id(), version = %request.version, "spawned retraining process");
        Ok(Box::new(ProcessJob { child: Some(child) }))
    }
}

struct ProcessJob {
    child: Option<Child>,
}

impl RetrainJob for ProcessJob {
    fn poll(&mut self) -> Option<JobExit> {
        let child = self.child.as_mut()?;
        match child.try_wait() {
            Ok(Some(status)) => {
                self.child = None;
                Some(if status.success() { JobExit::Success } else { JobExit::Failed(status.code()) })
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "lost track of retraining process");
                self.child = None;
                Some(JobExit::Failed(None))
            }
        }
    }

    fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!(error = %e, "retraining process already gone");
            }
            // reap if it is already dead, never block
            let _ = child.try_wait();
        }
    }
}

/// Trains on a background thread with a cancellation flag
#[derive(Debug, Clone)]
pub struct ThreadLauncher {
    layout: CheckpointLayout,
    target: QosTarget,
    config: TrainConfig,
    duration_log: Option<DurationLog>,
}

impl ThreadLauncher {
    pub fn new(layout: CheckpointLayout, target: QosTarget, config: TrainConfig) -> Self {
        Self { layout, target, config, duration_log: None }
    }

    pub fn with_duration_log(mut self, log: DurationLog) -> Self {
        self.duration_log = Some(log);
        self
    }
}

impl JobLauncher for ThreadLauncher {
    fn spawn(&mut self, request: &RetrainRequest) -> Result<Box<dyn RetrainJob>> {
        self.config.validate()?;
        let cancel = Arc::new(AtomicBool::new(false));
        let outputs = TrainOutputs {
            checkpoint: Some(self.layout.weights(request.version, self.target)),
            duration_log: self.duration_log.clone(),
            cancel: Some(Arc::clone(&cancel)),
        };
        let dataset = request.dataset_dir.clone();
        let config = self.config.clone();
        let target = self.target;
        let version = request.version;

        let handle = std::thread::Builder::new()
            .name(format!("retrain-{version}"))
            .spawn(move || {
                let factory = || VirtualTwin::untrained(target, config.hidden_dim, config.seed);
                match train_and_evaluate(&dataset, factory, &config, &outputs) {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::warn!(%version, error = %e, "background retraining failed");
                        false
                    }
                }
            })
            .map_err(|e| Error::Job(format!("cannot start training thread: {e}")))?;

        Ok(Box::new(ThreadJob { handle: Some(handle), cancel }))
    }
}

struct ThreadJob {
    handle: Option<JoinHandle<bool>>,
    cancel: Arc<AtomicBool>,
}

impl RetrainJob for ThreadJob {
    fn poll(&mut self) -> Option<JobExit> {
        if !self.handle.as_ref()?.is_finished() {
            return None;
        }
        let handle = self.handle.take()?;
        Some(match handle.join() {
            Ok(true) => JobExit::Success,
            Ok(false) | Err(_) => JobExit::Failed(None),
        })
    }

    fn kill(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        // detach: the thread stops at its next step
        self.handle = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Topology;
    use crate::data::{SynthConfig, SyntheticLadder};
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn wait(job: &mut dyn RetrainJob) -> JobExit {
        let start = Instant::now();
        loop {
            if let Some(exit) = job.poll() {
                return exit;
            }
            assert!(start.elapsed() < Duration::from_secs(60), "job never finished");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_process_command_line() {
        let launcher = ProcessLauncher::new("/bin/gemelo", CheckpointLayout::new("/w"), QosTarget::Delay)
            .with_config_file("exp.yaml");
        let request = RetrainRequest { version: ModelVersion(2), dataset_dir: "/d/experiment_102_cv".into() };
        let cmd = launcher.command(&request);
        let args: Vec<String> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "--quiet",
                "train",
                "--dataset",
                "/d/experiment_102_cv",
                "--target",
                "delay",
                "--checkpoint",
                "/w/model_version_2/delay_final_weight",
                "--config",
                "exp.yaml",
            ]
        );
    }

    #[test]
    fn test_process_command_forwards_training() {
        let config = TrainConfig { epochs: 3, seed: 9, ..Default::default() };
        let launcher = ProcessLauncher::new("gemelo", CheckpointLayout::new("w"), QosTarget::Jitter)
            .with_duration_log(&DurationLog::new("t.json"))
            .with_training(&config);
        let request = RetrainRequest { version: ModelVersion(1), dataset_dir: "d".into() };
        let args: Vec<String> =
            launcher.command(&request).get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        let tail: Vec<&str> = args[8..].iter().map(String::as_str).collect();
        assert_eq!(tail, vec!["--duration-log", "t.json", "--epochs", "3", "--lr", "0.001", "--seed", "9"]);
    }

    #[test]
    fn test_missing_program_is_job_error() {
        let mut launcher =
            ProcessLauncher::new("/nonexistent/gemelo-binary", CheckpointLayout::new("/w"), QosTarget::Delay);
        let request = RetrainRequest { version: ModelVersion(1), dataset_dir: "/d".into() };
        assert!(matches!(launcher.spawn(&request), Err(Error::Job(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_exit_status_is_reported() {
        let mut ok = ProcessJob { child: Some(Command::new("true").spawn().unwrap()) };
        assert_eq!(wait(&mut ok), JobExit::Success);
        assert_eq!(ok.poll(), None);

        let mut failed = ProcessJob { child: Some(Command::new("false").spawn().unwrap()) };
        assert_eq!(wait(&mut failed), JobExit::Failed(Some(1)));
    }

    #[cfg(unix)]
    #[test]
    fn test_kill_does_not_block() {
        let mut job = ProcessJob { child: Some(Command::new("sleep").arg("30").spawn().unwrap()) };
        assert_eq!(job.poll(), None);
        job.kill();
        assert_eq!(job.poll(), None);
    }

    #[test]
    fn test_thread_launcher_writes_checkpoint() {
        let tmp = TempDir::new().unwrap();
        let synth = SynthConfig { training_windows: 4, validation_windows: 2, testing_windows: 1, ..Default::default() };
        let dirs = SyntheticLadder::new(synth, QosTarget::Delay)
            .unwrap()
            .write_ladder(tmp.path(), Topology::Germany, &[0])
            .unwrap();

        let layout = CheckpointLayout::new(tmp.path().join("weights"));
        let config = TrainConfig { epochs: 2, hidden_dim: 4, ..Default::default() };
        let mut launcher = ThreadLauncher::new(layout.clone(), QosTarget::Delay, config);
        let mut job = launcher
            .spawn(&RetrainRequest { version: ModelVersion(0), dataset_dir: dirs[0].clone() })
            .unwrap();

        assert_eq!(wait(job.as_mut()), JobExit::Success);
        assert!(layout.weights(ModelVersion(0), QosTarget::Delay).is_file());
    }

    #[test]
    fn test_thread_launcher_missing_dataset_fails() {
        let tmp = TempDir::new().unwrap();
        let config = TrainConfig { epochs: 1, ..Default::default() };
        let mut launcher = ThreadLauncher::new(CheckpointLayout::new(tmp.path()), QosTarget::Jitter, config);
        let mut job = launcher
            .spawn(&RetrainRequest { version: ModelVersion(1), dataset_dir: tmp.path().join("missing") })
            .unwrap();
        assert_eq!(wait(job.as_mut()), JobExit::Failed(None));
    }
}
