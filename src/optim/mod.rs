//! Optimizers for training the twin

mod adam;
mod clip;
mod optimizer;

pub use adam::Adam;
pub use clip::clip_grad_norm;
pub use optimizer::Optimizer;
