//! Window samples: per-flow features plus ground-truth labels

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Feature mapping of one traffic window
///
/// All `flow_*` arrays are indexed by flow; `link_capacity` is indexed by link
/// and `flow_to_link[f]` lists the links traversed by flow `f` in path order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowFeatures {
    /// Offered traffic rate per flow
    pub flow_traffic: Vec<f32>,
    /// Mean packet count per flow
    pub flow_length: Vec<f32>,
    /// Packet loss per flow
    pub flow_loss_packet: Vec<f32>,
    /// Propagation delay along the flow's path
    pub flow_propag_delay: Vec<f32>,
    /// Mean packet size per flow
    pub flow_packet_size: Vec<f32>,
    /// Capacity of every link in the topology
    pub link_capacity: Vec<f32>,
    /// Links traversed by each flow
    pub flow_to_link: Vec<Vec<usize>>,
    /// Per-flow delay budget (SLA use case only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_delay_budget: Option<Vec<f32>>,
}

impl FlowFeatures {
    /// Number of flows in the window
    pub fn num_flows(&self) -> usize {
        self.flow_traffic.len()
    }

    /// Number of links in the topology
    pub fn num_links(&self) -> usize {
        self.link_capacity.len()
    }

    /// Values of a normalized field by name
    ///
    /// Returns `None` for names that are not normalized numeric fields.
    pub fn field(&self, name: &str) -> Option<&[f32]> {
        match name {
            "flow_traffic" => Some(&self.flow_traffic),
            "flow_length" => Some(&self.flow_length),
            "flow_loss_packet" => Some(&self.flow_loss_packet),
            "flow_propag_delay" => Some(&self.flow_propag_delay),
            "flow_packet_size" => Some(&self.flow_packet_size),
            "link_capacity" => Some(&self.link_capacity),
            _ => None,
        }
    }

    /// Check that every array agrees on the number of flows and links
    pub fn validate(&self) -> Result<()> {
        let n = self.num_flows();
        let per_flow: [(&str, usize); 5] = [
            ("flow_length", self.flow_length.len()),
            ("flow_loss_packet", self.flow_loss_packet.len()),
            ("flow_propag_delay", self.flow_propag_delay.len()),
            ("flow_packet_size", self.flow_packet_size.len()),
            ("flow_to_link", self.flow_to_link.len()),
        ];
        for (field, len) in per_flow {
            if len != n {
                return Err(Error::ShapeMismatch { field: field.to_string(), expected: n, actual: len });
            }
        }
        if let Some(budget) = &self.flow_delay_budget {
            if budget.len() != n {
                return Err(Error::ShapeMismatch {
                    field: "flow_delay_budget".to_string(),
                    expected: n,
                    actual: budget.len(),
                });
            }
        }

        let links = self.num_links();
        for path in &self.flow_to_link {
            if path.is_empty() {
                return Err(Error::ConfigError("flow_to_link contains an empty path".to_string()));
            }
            if let Some(&bad) = path.iter().find(|&&l| l >= links) {
                return Err(Error::ShapeMismatch {
                    field: "flow_to_link".to_string(),
                    expected: links,
                    actual: bad + 1,
                });
            }
        }
        if self.link_capacity.iter().any(|&c| c <= 0.0 || !c.is_finite()) {
            return Err(Error::ConfigError("link_capacity must be positive and finite".to_string()));
        }
        Ok(())
    }
}

/// One window: features and the ground-truth QoS value per flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub features: FlowFeatures,
    pub labels: Vec<f32>,
}

impl Sample {
    /// Number of flows in the window
    pub fn num_flows(&self) -> usize {
        self.labels.len()
    }

    /// Validate feature shapes and the label length
    pub fn validate(&self) -> Result<()> {
        self.features.validate()?;
        if self.labels.len() != self.features.num_flows() {
            return Err(Error::ShapeMismatch {
                field: "labels".to_string(),
                expected: self.features.num_flows(),
                actual: self.labels.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Small two-link window where every flow crosses both links
    pub fn tiny_sample(traffic: &[f32]) -> Sample {
        let n = traffic.len();
        Sample {
            features: FlowFeatures {
                flow_traffic: traffic.to_vec(),
                flow_length: vec![10.0; n],
                flow_loss_packet: vec![0.0; n],
                flow_propag_delay: vec![0.01; n],
                flow_packet_size: vec![1000.0; n],
                link_capacity: vec![100.0, 200.0],
                flow_to_link: vec![vec![0, 1]; n],
                flow_delay_budget: None,
            },
            labels: traffic.iter().map(|t| 0.01 + t / 1000.0).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::tiny_sample;
    use super::*;

    #[test]
    fn test_valid_sample() {
        let sample = tiny_sample(&[1.0, 2.0, 3.0]);
        assert_eq!(sample.num_flows(), 3);
        assert!(sample.validate().is_ok());
    }

    #[test]
    fn test_label_length_mismatch() {
        let mut sample = tiny_sample(&[1.0, 2.0]);
        sample.labels.pop();
        let err = sample.validate().unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { ref field, expected: 2, actual: 1 } if field == "labels"));
    }

    #[test]
    fn test_link_index_out_of_range() {
        let mut sample = tiny_sample(&[1.0]);
        sample.features.flow_to_link[0] = vec![0, 5];
        assert!(sample.validate().is_err());
    }

    #[test]
    fn test_budget_length_checked() {
        let mut sample = tiny_sample(&[1.0, 2.0]);
        sample.features.flow_delay_budget = Some(vec![0.1]);
        assert!(sample.validate().is_err());
    }

    #[test]
    fn test_field_lookup() {
        let sample = tiny_sample(&[4.0]);
        assert_eq!(sample.features.field("flow_traffic"), Some(&[4.0][..]));
        assert_eq!(sample.features.field("link_capacity").map(<[f32]>::len), Some(2));
        assert!(sample.features.field("flow_to_link").is_none());
    }

    #[test]
    fn test_budget_omitted_from_json_when_absent() {
        let sample = tiny_sample(&[1.0]);
        let json = serde_json::to_string(&sample).unwrap();
        assert!(!json.contains("flow_delay_budget"));
        let back: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample);
    }
}
