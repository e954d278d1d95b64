//! Tests for the virtual twin.

use super::*;
use crate::config::QosTarget;
use crate::data::fixtures::tiny_sample;
use crate::data::NormalizationTable;
use crate::error::Error;
use approx::assert_relative_eq;

fn fitted(target: QosTarget) -> (VirtualTwin, crate::data::Sample) {
    let sample = tiny_sample(&[10.0, 30.0, 20.0, 5.0]);
    let mut twin = VirtualTwin::untrained(target, 8, 3);
    twin.set_normalization(NormalizationTable::fit([&sample]).unwrap());
    (twin, sample)
}

#[test]
fn test_predict_requires_normalization() {
    let sample = tiny_sample(&[1.0, 2.0]);
    let twin = VirtualTwin::untrained(QosTarget::Delay, 8, 0);
    assert!(matches!(twin.predict(&sample.features), Err(Error::MissingNormalization)));
}

#[test]
fn test_predict_rejects_bad_link_index() {
    let (twin, mut sample) = fitted(QosTarget::Delay);
    sample.features.flow_to_link[0] = vec![999];
    assert!(matches!(twin.predict(&sample.features), Err(Error::ShapeMismatch { .. })));
}

#[test]
fn test_predict_one_value_per_flow() {
    let (twin, sample) = fitted(QosTarget::Delay);
    let pred = twin.predict(&sample.features).unwrap();
    assert_eq!(pred.len(), sample.labels.len());
    // softplus output plus propagation delay
    assert!(pred.iter().all(|&p| p > 0.01));
}

#[test]
fn test_predict_is_deterministic() {
    let (twin, sample) = fitted(QosTarget::Jitter);
    assert_eq!(twin.predict(&sample.features).unwrap(), twin.predict(&sample.features).unwrap());
}

#[test]
fn test_jitter_excludes_propagation() {
    let (delay, sample) = fitted(QosTarget::Delay);
    let mut jitter = VirtualTwin::from_weights(QosTarget::Jitter, delay.weights().clone()).unwrap();
    jitter.set_normalization(delay.normalization().unwrap().clone());
    let d = delay.predict(&sample.features).unwrap();
    let j = jitter.predict(&sample.features).unwrap();
    for (a, b) in d.iter().zip(&j) {
        assert_relative_eq!(a - b, 0.01, epsilon = 1e-6);
    }
}

#[test]
fn test_from_weights_rejects_wrong_input_dim() {
    let weights = TwinWeights::init(4, 8, 0);
    assert!(VirtualTwin::from_weights(QosTarget::Delay, weights).is_err());
}

#[test]
fn test_backward_matches_finite_differences() {
    let (twin, sample) = fitted(QosTarget::Delay);
    // L = sum(output), so dL/d output = 1
    let loss = |t: &VirtualTwin| -> f64 {
        t.predict(&sample.features).unwrap().iter().map(|&v| f64::from(v)).sum()
    };
    let pass = twin.forward(&sample.features).unwrap();
    let grads = twin.backward(&pass, &vec![1.0; pass.output.len()]).unwrap();

    let eps = 1e-3f32;
    for (buffer, index) in [(0usize, 5usize), (1, 2), (2, 7), (3, 0)] {
        let mut plus = twin.clone();
        plus.weights_mut().buffers_mut()[buffer][index] += eps;
        let mut minus = twin.clone();
        minus.weights_mut().buffers_mut()[buffer][index] -= eps;
        let numeric = (loss(&plus) - loss(&minus)) / (2.0 * f64::from(eps));
        let analytic = f64::from(grads.buffers()[buffer][index]);
        assert!(
            (numeric - analytic).abs() < 1e-2 * (1.0 + analytic.abs()),
            "buffer {buffer}[{index}]: numeric {numeric} vs analytic {analytic}"
        );
    }
}

#[test]
fn test_backward_rejects_wrong_length() {
    let (twin, sample) = fitted(QosTarget::Delay);
    let pass = twin.forward(&sample.features).unwrap();
    assert!(twin.backward(&pass, &[1.0]).is_err());
}
