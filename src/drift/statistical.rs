//! Two-sample Kolmogorov-Smirnov helpers.

/// Two-sample KS statistic `sup |F_a(x) - F_b(x)|`
///
/// Both slices must already be sorted ascending. Tied values are consumed
/// together on both sides before the CDFs are compared, so identical samples
/// give exactly `0.0`.
pub fn ks_statistic_sorted(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let n = a.len() as f64;
    let m = b.len() as f64;

    let mut d_max = 0.0f64;
    let (mut i, mut j) = (0usize, 0usize);
    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d_max = d_max.max((i as f64 / n - j as f64 / m).abs());
    }
    d_max
}

/// Sort copies of both samples and compute the KS statistic
pub fn ks_statistic(a: &[f64], b: &[f64]) -> f64 {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);
    ks_statistic_sorted(&a, &b)
}

/// Approximate p-value for KS statistic using Kolmogorov distribution
pub fn ks_p_value(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    // P(D > d) ≈ 2 * sum_{k=1}^∞ (-1)^{k+1} * exp(-2 * k^2 * λ^2)
    let mut p = 0.0;
    for k in 1..=100 {
        let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
        let term = sign * (-2.0 * f64::from(k).powi(2) * lambda.powi(2)).exp();
        p += term;
        if term.abs() < 1e-10 {
            break;
        }
    }
    (2.0 * p).clamp(0.0, 1.0)
}

/// Two-sample KS test returning `(statistic, p_value)`
pub fn ks_two_sample(a: &[f64], b: &[f64]) -> (f64, f64) {
    let d = ks_statistic(a, b);
    let n = a.len() as f64;
    let m = b.len() as f64;
    if n == 0.0 || m == 0.0 {
        return (d, 1.0);
    }
    let lambda = d * (n * m / (n + m)).sqrt();
    (d, ks_p_value(lambda))
}
