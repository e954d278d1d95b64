//! Per-flow input features derived from a window

use crate::data::{FlowFeatures, NormalizationTable};
use crate::error::Result;
use ndarray::Array2;

/// Utilisation cap applied before the queueing factor
const UTILISATION_CAP: f32 = 0.95;

/// Width of a feature row
pub const INPUT_DIM: usize = 9;

/// Link utilisation: offered traffic of the flows crossing a link over its capacity
///
/// `features` must have passed [`FlowFeatures::validate`].
fn link_utilisation(features: &FlowFeatures) -> Vec<f32> {
    let mut load = vec![0.0f32; features.num_links()];
    for (flow, path) in features.flow_to_link.iter().enumerate() {
        for &link in path {
            load[link] += features.flow_traffic[flow];
        }
    }
    load.iter().zip(&features.link_capacity).map(|(l, c)| l / c).collect()
}

/// Build the `(flows, INPUT_DIM)` feature matrix
///
/// Columns: normalized traffic, length, loss and propagation delay; summed and
/// peak utilisation over the path; mean normalized capacity over the path; mean
/// queueing factor `1 / (1 - ρ)`; hop count.
///
/// Windows whose per-flow columns or link indices do not line up are rejected
/// with [`Error::ShapeMismatch`](crate::error::Error::ShapeMismatch).
pub fn extract(features: &FlowFeatures, table: &NormalizationTable) -> Result<Array2<f32>> {
    features.validate()?;
    let traffic = table.normalize(features, "flow_traffic")?;
    let length = table.normalize(features, "flow_length")?;
    let loss = table.normalize(features, "flow_loss_packet")?;
    let propag = table.normalize(features, "flow_propag_delay")?;
    let capacity = table.normalize(features, "link_capacity")?;
    let util = link_utilisation(features);

    let n = features.num_flows();
    let mut x = Array2::<f32>::zeros((n, INPUT_DIM));
    for (f, path) in features.flow_to_link.iter().enumerate() {
        let hops = path.len() as f32;
        let mut util_sum = 0.0f32;
        let mut util_max = 0.0f32;
        let mut cap_sum = 0.0f32;
        let mut queue_sum = 0.0f32;
        for &link in path {
            let rho = util[link];
            util_sum += rho;
            util_max = util_max.max(rho);
            cap_sum += capacity[link];
            queue_sum += 1.0 / (1.0 - rho.min(UTILISATION_CAP));
        }
        let row = [
            traffic[f],
            length[f],
            loss[f],
            propag[f],
            util_sum,
            util_max,
            cap_sum / hops,
            queue_sum / hops,
            hops,
        ];
        x.row_mut(f).iter_mut().zip(row).for_each(|(dst, v)| *dst = v);
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::tiny_sample;
    use crate::error::Error;
    use approx::assert_relative_eq;

    #[test]
    fn test_link_utilisation() {
        let sample = tiny_sample(&[10.0, 30.0]);
        let util = link_utilisation(&sample.features);
        assert_relative_eq!(util[0], 40.0 / 100.0);
        assert_relative_eq!(util[1], 40.0 / 200.0);
    }

    #[test]
    fn test_feature_matrix_shape_and_path_columns() {
        let sample = tiny_sample(&[10.0, 30.0, 20.0]);
        let table = NormalizationTable::fit([&sample]).unwrap();
        let x = extract(&sample.features, &table).unwrap();
        assert_eq!(x.dim(), (3, INPUT_DIM));
        // total load 60: utilisation 0.6 and 0.3
        assert_relative_eq!(x[[0, 4]], 0.9, epsilon = 1e-6);
        assert_relative_eq!(x[[0, 5]], 0.6, epsilon = 1e-6);
        assert_relative_eq!(x[[2, 8]], 2.0);
        assert!(x.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_out_of_range_link_is_rejected() {
        let mut sample = tiny_sample(&[10.0, 30.0]);
        let table = NormalizationTable::fit([&sample]).unwrap();
        sample.features.flow_to_link[0] = vec![999];
        let err = extract(&sample.features, &table).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { ref field, .. } if field == "flow_to_link"));
    }

    #[test]
    fn test_short_traffic_column_is_rejected() {
        let mut sample = tiny_sample(&[10.0, 30.0]);
        let table = NormalizationTable::fit([&sample]).unwrap();
        sample.features.flow_propag_delay.pop();
        assert!(matches!(extract(&sample.features, &table), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_saturated_link_is_capped() {
        let sample = tiny_sample(&[500.0]);
        let table = NormalizationTable::fit([&sample]).unwrap();
        let x = extract(&sample.features, &table).unwrap();
        // link 0 is at 5x capacity; its queueing factor is capped at 1 / 0.05
        assert!(x[[0, 7]] <= 20.0 + 1e-3);
        assert!(x[[0, 7]].is_finite());
    }
}
