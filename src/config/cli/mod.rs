//! CLI argument parsing
//!
//! ```bash
//! gemelo run -t germany -d ./data -r 3 --sync
//! gemelo run --config experiment.yaml --no-sync
//! gemelo train --dataset data/germany/experiment_201_cv --checkpoint weights/model_version_1/delay_final_weight
//! gemelo synth -o ./data -t germany
//! gemelo report results/germany/results_delay_sync_true_r_0.json --change-points 50,100
//! ```

mod core;
mod types;

pub use self::core::{
    apply_overrides, apply_train_overrides, parse_args, Cli, Command, ReportArgs, RunArgs, SynthArgs, TrainArgs,
};
pub use types::OutputFormat;
