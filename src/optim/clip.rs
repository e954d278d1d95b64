//! Gradient clipping utilities

/// Clip gradients by global norm
///
/// Scales every buffer by `max_norm / global_norm` when the global norm
/// exceeds `max_norm`. Returns the norm before clipping.
pub fn clip_grad_norm(grads: &mut [&mut [f32]], max_norm: f32) -> f32 {
    let total_norm_sq: f32 = grads.iter().flat_map(|g| g.iter()).map(|&g| g * g).sum();
    let global_norm = total_norm_sq.sqrt();

    if global_norm > max_norm {
        let clip_coef = max_norm / global_norm;
        grads.iter_mut().flat_map(|g| g.iter_mut()).for_each(|g| *g *= clip_coef);
    }

    global_norm
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_clip_scales_to_max_norm() {
        let mut a = vec![3.0f32];
        let mut b = vec![4.0f32];
        let norm = clip_grad_norm(&mut [a.as_mut_slice(), b.as_mut_slice()], 1.0);
        assert_relative_eq!(norm, 5.0);
        assert_relative_eq!(a[0], 0.6);
        assert_relative_eq!(b[0], 0.8);
    }

    #[test]
    fn test_no_clip_below_threshold() {
        let mut a = vec![0.1f32, 0.1];
        clip_grad_norm(&mut [a.as_mut_slice()], 1.0);
        assert_eq!(a, vec![0.1, 0.1]);
    }
}
