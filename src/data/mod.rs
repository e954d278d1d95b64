//! Traffic windows, dataset splits and normalization statistics

mod ladder;
mod reader;
mod sample;
mod stats;
mod synthetic;

pub use ladder::TrainingLadder;
pub use reader::{load_split, write_split, ConcatStream, Split, SplitReader};
pub use sample::{FlowFeatures, Sample};
pub use stats::{FieldStats, NormalizationTable, NORMALIZED_FIELDS};
pub use synthetic::{SynthConfig, SyntheticLadder};

#[cfg(test)]
pub(crate) use sample::fixtures;
