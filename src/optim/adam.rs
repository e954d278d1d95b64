//! Adam optimizer

use super::Optimizer;
use ndarray::{Array1, ArrayView1, ArrayViewMut1, Zip};

/// Adam optimizer
///
/// m_t = β1 m + (1 - β1) g, v_t = β2 v + (1 - β2) g², and
/// θ_t = θ - lr_t m_t / (√v_t + ε) with the bias-corrected rate
/// lr_t = lr √(1 - β2^t) / (1 - β1^t).
#[derive(Debug, Clone)]
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    t: u64,
    m: Vec<Array1<f32>>, // First moment
    v: Vec<Array1<f32>>, // Second moment
}

impl Adam {
    /// Create a new Adam optimizer
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self { lr, beta1, beta2, epsilon, t: 0, m: Vec::new(), v: Vec::new() }
    }

    /// Create Adam with default parameters (β1 = 0.9, β2 = 0.999, ε = 1e-7)
    pub fn default_params(lr: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-7)
    }

    /// Get optimizer step counter.
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.t
    }

    /// Initialize moments if needed
    fn ensure_moments(&mut self, params: &[&mut [f32]]) {
        if self.m.len() != params.len() || self.m.iter().zip(params).any(|(m, p)| m.len() != p.len()) {
            self.m = params.iter().map(|p| Array1::zeros(p.len())).collect();
            self.v = params.iter().map(|p| Array1::zeros(p.len())).collect();
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [&mut [f32]], grads: &[&[f32]]) {
        self.ensure_moments(params);
        self.t += 1;

        // Bias correction factors
        let t = self.t.min(i32::MAX as u64) as i32;
        let lr_t = self.lr * ((1.0 - self.beta2.powi(t)).sqrt() / (1.0 - self.beta1.powi(t)));
        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.epsilon);

        for (i, (param, grad)) in params.iter_mut().zip(grads).enumerate() {
            let param = ArrayViewMut1::from(&mut **param);
            let grad = ArrayView1::from(*grad);
            Zip::from(param)
                .and(&grad)
                .and(&mut self.m[i])
                .and(&mut self.v[i])
                .for_each(|p, &g, m, v| {
                    *m = beta1 * *m + (1.0 - beta1) * g;
                    *v = beta2 * *v + (1.0 - beta2) * g * g;
                    *p -= lr_t * *m / (v.sqrt() + eps);
                });
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_first_step_moves_by_lr() {
        // Bias correction makes the first step exactly lr * sign(g) (up to ε)
        let mut adam = Adam::default_params(0.01);
        let mut p = vec![1.0f32, -1.0];
        let g = [0.5f32, -3.0];
        adam.step(&mut [p.as_mut_slice()], &[&g[..]]);
        assert_abs_diff_eq!(p[0], 0.99, epsilon = 1e-5);
        assert_abs_diff_eq!(p[1], -0.99, epsilon = 1e-5);
        assert_eq!(adam.step_count(), 1);
    }

    #[test]
    fn test_minimizes_quadratic() {
        let mut adam = Adam::default_params(0.1);
        let mut x = vec![5.0f32];
        for _ in 0..500 {
            let g = [2.0 * (x[0] - 2.0)];
            adam.step(&mut [x.as_mut_slice()], &[&g[..]]);
        }
        assert_abs_diff_eq!(x[0], 2.0, epsilon = 5e-2);
    }

    #[test]
    fn test_zero_gradient_keeps_params() {
        let mut adam = Adam::default_params(0.1);
        let mut p = vec![0.3f32; 4];
        let g = [0.0f32; 4];
        adam.step(&mut [p.as_mut_slice()], &[&g[..]]);
        assert_eq!(p, vec![0.3; 4]);
    }

    #[test]
    fn test_set_lr() {
        let mut adam = Adam::default_params(0.001);
        adam.set_lr(0.0005);
        assert_eq!(adam.lr(), 0.0005);
    }
}
