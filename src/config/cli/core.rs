//! Core CLI types - Cli, Command and argument structs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::types::OutputFormat;
use crate::config::schema::{LauncherKind, SyncSpec};
use crate::config::topology::{QosTarget, Topology};
use crate::train::TrainConfig;

/// Gemelo: network digital twin synchronization
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "gemelo")]
#[command(version)]
#[command(about = "Network digital twin with drift-triggered retraining and hot model swaps")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Stream the testing splits through the twin, retraining on drift
    Run(RunArgs),

    /// Train one model version (the retraining job)
    Train(TrainArgs),

    /// Write a synthetic training ladder
    Synth(SynthArgs),

    /// Summarize a results file
    Report(ReportArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct RunArgs {
    /// Experiment file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Topology (5g_crosshaul, germany, passion)
    #[arg(short, long)]
    pub topology: Option<Topology>,

    /// Dataset root
    #[arg(short = 'd', long = "dir")]
    pub data_dir: Option<PathBuf>,

    /// QoS target (delay, jitter)
    #[arg(long)]
    pub target: Option<QosTarget>,

    /// Number of realizations
    #[arg(short, long)]
    pub realizations: Option<usize>,

    /// Enable twin synchronization
    #[arg(short, long, conflicts_with = "no_sync")]
    pub sync: bool,

    /// Disable twin synchronization even if the experiment file enables it
    #[arg(long)]
    pub no_sync: bool,

    /// Ladder entry suffixes, comma separated
    #[arg(long, value_delimiter = ',')]
    pub suffixes: Option<Vec<u32>>,

    /// Override checkpoint directory
    #[arg(long)]
    pub checkpoint_dir: Option<PathBuf>,

    /// Override results directory
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Override training epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Record SLA violation counts
    #[arg(long)]
    pub sla: bool,

    /// Never sleep between flows
    #[arg(long)]
    pub no_pacing: bool,

    /// How retraining jobs run (process, thread)
    #[arg(long)]
    pub launcher: Option<LauncherKind>,

    /// Validate the experiment without running it
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the train command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    /// Dataset directory with training and validation splits
    #[arg(long)]
    pub dataset: PathBuf,

    /// Weights file rewritten after every epoch
    #[arg(long)]
    pub checkpoint: PathBuf,

    /// QoS target (delay, jitter)
    #[arg(long, default_value = "delay")]
    pub target: QosTarget,

    /// Experiment file whose `training` section is used
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Duration log the elapsed training time is appended to
    #[arg(long)]
    pub duration_log: Option<PathBuf>,

    /// Override number of epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Override learning rate
    #[arg(short, long)]
    pub lr: Option<f32>,

    /// Seed of the weight initialisation
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for the synth command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct SynthArgs {
    /// Dataset root to write into
    #[arg(short, long)]
    pub output: PathBuf,

    /// Topology whose naming convention is used
    #[arg(short, long)]
    pub topology: Topology,

    /// QoS target the labels describe
    #[arg(long, default_value = "delay")]
    pub target: QosTarget,

    /// Ladder entry suffixes, comma separated
    #[arg(long, value_delimiter = ',', default_value = "0,1,2,4")]
    pub suffixes: Vec<u32>,

    /// Windows per testing split
    #[arg(long)]
    pub testing_windows: Option<usize>,

    /// Flows per window
    #[arg(long)]
    pub flows: Option<usize>,

    /// Per-flow delay budget for SLA runs
    #[arg(long)]
    pub delay_budget: Option<f32>,

    /// Generator seed
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for the report command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ReportArgs {
    /// Results file written by `run`
    #[arg(value_name = "RESULTS")]
    pub results: PathBuf,

    /// Known change points (window indices), comma separated
    #[arg(long, value_delimiter = ',')]
    pub change_points: Vec<usize>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to an experiment spec
pub fn apply_overrides(spec: &mut SyncSpec, args: &RunArgs) {
    if let Some(topology) = args.topology {
        spec.topology = Some(topology);
    }
    if let Some(dir) = &args.data_dir {
        spec.data.root = Some(dir.clone());
    }
    if let Some(target) = args.target {
        spec.target = target;
    }
    if let Some(realizations) = args.realizations {
        spec.realizations = realizations;
    }
    if args.sync {
        spec.sync.enabled = true;
    }
    if args.no_sync {
        spec.sync.enabled = false;
    }
    if let Some(suffixes) = &args.suffixes {
        spec.data.suffixes = suffixes.clone();
    }
    if let Some(dir) = &args.checkpoint_dir {
        spec.output.checkpoint_dir = dir.clone();
    }
    if let Some(dir) = &args.results_dir {
        spec.output.results_dir = dir.clone();
    }
    if let Some(epochs) = args.epochs {
        spec.training.epochs = epochs;
    }
    if args.sla {
        spec.sync.sla = true;
    }
    if args.no_pacing {
        spec.pacing.enabled = false;
    }
    if let Some(launcher) = args.launcher {
        spec.sync.launcher = launcher;
    }
}

/// Apply command-line overrides to training hyperparameters
pub fn apply_train_overrides(config: &mut TrainConfig, args: &TrainArgs) {
    if let Some(epochs) = args.epochs {
        config.epochs = epochs;
    }
    if let Some(lr) = args.lr {
        config.lr = lr;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
}
