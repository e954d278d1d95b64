//! Optimizer trait

/// Trait for optimization algorithms over flat parameter buffers
///
/// `params[i]` and `grads[i]` must have the same length and keep the same
/// order from one step to the next; state is keyed by buffer position.
pub trait Optimizer {
    /// Perform a single optimization step
    fn step(&mut self, params: &mut [&mut [f32]], grads: &[&[f32]]);

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);
}
