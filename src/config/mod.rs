//! Experiment configuration
//!
//! - `cli`: clap command line
//! - `schema`: YAML experiment file
//! - `topology`: topology profiles and QoS targets
//! - `validate`: checks run before anything is written

mod cli;
mod schema;
mod topology;
mod validate;

pub use cli::{
    apply_overrides, apply_train_overrides, parse_args, Cli, Command, OutputFormat, ReportArgs, RunArgs, SynthArgs,
    TrainArgs,
};
pub use schema::{
    load_spec, parse_spec, DataSpec, LauncherKind, OutputSpec, PacingSpec, SyncSection, SyncSpec, DEFAULT_SUFFIXES,
};
pub use topology::{QosTarget, Topology};
pub use validate::{validate_spec, ValidationError};
