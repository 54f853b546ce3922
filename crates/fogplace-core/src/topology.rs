//! Physical topology: compute nodes, their links, and the sensors and
//! actuators attached to gateway nodes.
//!
//! Units are caller-defined but must be consistent: link bandwidth is in
//! the same unit per second as `AppEdge::tuple_nw_length`, node MIPS in the
//! unit of `AppEdge::tuple_cpu_length` per second. `f64::INFINITY` marks an
//! unbounded capacity (cloud-like nodes).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// Per-resource unit prices charged by a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourcePrice {
    pub mips: f64,
    pub ram: f64,
    pub storage: f64,
    pub bandwidth: f64,
}

/// Directed link from the owning node to `node`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub node: NodeId,
    /// Seconds.
    pub latency: f64,
    pub bandwidth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub mips: f64,
    pub ram: f64,
    pub storage: f64,
    #[serde(default)]
    pub busy_power: f64,
    #[serde(default)]
    pub idle_power: f64,
    #[serde(default)]
    pub price: ResourcePrice,
    /// Absent entry = no direct link.
    #[serde(default)]
    pub neighbors: Vec<Link>,
}

impl Node {
    pub fn new(id: u64, name: impl Into<String>, mips: f64, ram: f64, storage: f64) -> Self {
        Self {
            id: NodeId::new(id),
            name: name.into(),
            mips,
            ram,
            storage,
            busy_power: 0.0,
            idle_power: 0.0,
            price: ResourcePrice::default(),
            neighbors: Vec::new(),
        }
    }

    pub fn with_power(mut self, busy: f64, idle: f64) -> Self {
        self.busy_power = busy;
        self.idle_power = idle;
        self
    }

    pub fn with_price(mut self, price: ResourcePrice) -> Self {
        self.price = price;
        self
    }

    pub fn link(&self, to: NodeId) -> Option<&Link> {
        self.neighbors.iter().find(|l| l.node == to)
    }
}

/// Inter-emission time distribution of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Distribution {
    Deterministic { value: f64 },
    Normal { mean: f64, stddev: f64 },
    Uniform { min: f64, max: f64 },
}

impl Distribution {
    /// Shortest plausible inter-emission time (highest rate).
    ///
    /// Normal uses `mean - 3σ`. The result may be non-positive for a
    /// degenerate distribution; callers must reject that.
    pub fn worst_case_interval(&self) -> f64 {
        match *self {
            Distribution::Deterministic { value } => value,
            Distribution::Normal { mean, stddev } => mean - 3.0 * stddev,
            Distribution::Uniform { min, .. } => min,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub name: String,
    /// Tuple type emitted; matches the `source` of a sensor edge.
    pub tuple_type: String,
    pub gateway: NodeId,
    pub emission: Distribution,
    /// Sensor → gateway latency (seconds).
    #[serde(default)]
    pub latency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actuator {
    pub name: String,
    /// Matches the `destination` of an actuator edge.
    pub actuator_type: String,
    pub gateway: NodeId,
    /// Gateway → actuator latency (seconds).
    #[serde(default)]
    pub latency: f64,
}

/// Explicit context handed to the extractor in place of global lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub sensors: Vec<Sensor>,
    #[serde(default)]
    pub actuators: Vec<Actuator>,
}

impl Topology {
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.push(node);
        id
    }

    /// Add a bidirectional link with identical characteristics both ways.
    /// Unknown endpoints are ignored here and reported by the extractor.
    pub fn connect(&mut self, a: NodeId, b: NodeId, latency: f64, bandwidth: f64) {
        for node in &mut self.nodes {
            let other = if node.id == a {
                b
            } else if node.id == b {
                a
            } else {
                continue;
            };
            node.neighbors.retain(|l| l.node != other);
            node.neighbors.push(Link {
                node: other,
                latency,
                bandwidth,
            });
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Module name → node hosting it in the previous optimization run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviousPlacement(pub BTreeMap<String, NodeId>);

impl PreviousPlacement {
    pub fn insert(&mut self, module: impl Into<String>, node: NodeId) {
        self.0.insert(module.into(), node);
    }

    pub fn get(&self, module: &str) -> Option<NodeId> {
        self.0.get(module).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worst_case_interval_per_distribution() {
        assert_eq!(Distribution::Deterministic { value: 5.0 }.worst_case_interval(), 5.0);
        let n = Distribution::Normal { mean: 5.0, stddev: 1.0 };
        assert!((n.worst_case_interval() - 2.0).abs() < 1e-12);
        assert_eq!(Distribution::Uniform { min: 1.5, max: 9.0 }.worst_case_interval(), 1.5);
    }

    #[test]
    fn connect_is_symmetric_and_idempotent() {
        let mut t = Topology::default();
        let a = t.add_node(Node::new(1, "a", 10.0, 10.0, 10.0));
        let b = t.add_node(Node::new(2, "b", 10.0, 10.0, 10.0));
        t.connect(a, b, 0.01, 100.0);
        t.connect(a, b, 0.02, 50.0);
        let la = t.node(a).unwrap().link(b).unwrap();
        let lb = t.node(b).unwrap().link(a).unwrap();
        assert_eq!(la.latency, 0.02);
        assert_eq!(lb.bandwidth, 50.0);
        assert_eq!(t.node(a).unwrap().neighbors.len(), 1);
    }

    #[test]
    fn distribution_serde_is_tagged() {
        let d: Distribution =
            serde_json::from_str(r#"{"kind":"normal","mean":3.0,"stddev":0.5}"#).unwrap();
        assert_eq!(d, Distribution::Normal { mean: 3.0, stddev: 0.5 });
    }
}
