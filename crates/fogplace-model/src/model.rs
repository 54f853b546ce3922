//! The immutable numeric model produced by the extractor.

use serde::{Deserialize, Serialize};

use fogplace_core::id::NodeId;
use fogplace_core::matrix::Matrix;
use fogplace_core::topology::ResourcePrice;

use crate::reach::HopIndex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub mips: f64,
    pub ram: f64,
    pub storage: f64,
    pub busy_power: f64,
    pub idle_power: f64,
    pub price: ResourcePrice,
}

impl NodeInfo {
    /// Power drawn on top of idle when fully busy.
    pub fn power_delta(&self) -> f64 {
        (self.busy_power - self.idle_power).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleKind {
    Service,
    Sensor,
    Actuator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub name: String,
    pub kind: ModuleKind,
    /// Worst-case MIPS demand derived by demand propagation.
    pub mips: f64,
    pub ram: f64,
    pub storage: f64,
    /// Worst-case inbound bandwidth demand.
    pub bandwidth: f64,
    pub is_client: bool,
    pub is_global: bool,
    pub migration_deadline: f64,
    /// Endpoint latency for sensors/actuators (device ↔ gateway).
    pub endpoint_latency: f64,
}

impl ModuleInfo {
    /// Bytes moved when the module migrates.
    pub fn size(&self) -> f64 {
        self.ram + self.storage
    }
}

/// Aggregated data flow between two modules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub source: usize,
    pub destination: usize,
    /// Tuples per second.
    pub rate: f64,
    pub bandwidth: f64,
}

/// A resolved QoS loop over module indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopSpec {
    pub modules: Vec<usize>,
    /// `deps[k]` is the dependency row for `modules[k] → modules[k+1]`.
    pub deps: Vec<usize>,
    pub deadline: f64,
    /// Sensor/actuator endpoint latency added to every evaluation.
    pub fixed_latency: f64,
}

/// Maxima over finite entries, used to normalize objective components.
/// A zero maximum leaves values unscaled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scales {
    pub mips: f64,
    pub ram: f64,
    pub storage: f64,
    pub bandwidth: f64,
    pub latency: f64,
    pub power_delta: f64,
    pub module_size: f64,
}

impl Scales {
    /// `value / max`, keeping non-finite values as the unbounded sentinel.
    pub fn normalize(value: f64, max: f64) -> f64 {
        if !value.is_finite() || max <= 0.0 || !max.is_finite() {
            value
        } else {
            value / max
        }
    }

    /// Largest finite element of `values`, or 0.
    pub fn finite_max(values: impl IntoIterator<Item = f64>) -> f64 {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }
}

/// Serialize-only: `INFINITY` latencies have no JSON round trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementModel {
    pub nodes: Vec<NodeInfo>,
    pub modules: Vec<ModuleInfo>,
    /// Node × Node link latency; `INFINITY` = no direct link, diagonal 0.
    pub latency: Matrix<f64>,
    /// Node × Node link bandwidth; 0 where no link exists.
    pub bandwidth: Matrix<f64>,
    pub dependencies: Vec<Dependency>,
    pub loops: Vec<LoopSpec>,
    /// Node × Module feasibility mask.
    pub possible_deployment: Matrix<u8>,
    /// Node × Module previous placement; `None` on the first run.
    pub current_placement: Option<Matrix<u8>>,
    pub hops: HopIndex,
    pub scales: Scales,
}

impl PlacementModel {
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_modules(&self) -> usize {
        self.modules.len()
    }

    /// Length of every routing row.
    pub fn num_slots(&self) -> usize {
        self.nodes.len()
    }

    /// A direct, finite-latency link `from → to` (never a self loop).
    pub fn has_link(&self, from: usize, to: usize) -> bool {
        from != to && self.latency[(from, to)].is_finite()
    }

    /// Routing step `prev → next` when filling slot `slot`: `next` must be a
    /// neighbour and still reach `dest` with the slots left after `slot`.
    pub fn is_valid_hop(&self, prev: usize, next: usize, dest: usize, slot: usize) -> bool {
        let remaining = self.num_slots().saturating_sub(slot + 1);
        self.has_link(prev, next) && self.hops.within(next, dest, remaining)
    }

    pub fn is_possible(&self, node: usize, module: usize) -> bool {
        self.possible_deployment[(node, module)] == 1
    }

    pub fn candidate_nodes(&self, module: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_nodes()).filter(move |&n| self.is_possible(n, module))
    }

    /// Node that hosted `module` in the previous run.
    pub fn previous_node(&self, module: usize) -> Option<usize> {
        let cur = self.current_placement.as_ref()?;
        (0..cur.rows()).find(|&n| cur[(n, module)] == 1)
    }

    pub fn dependency_index(&self, source: usize, destination: usize) -> Option<usize> {
        self.dependencies
            .iter()
            .position(|d| d.source == source && d.destination == destination)
    }

    /// Number of distinct other modules sharing a dependency with `module`.
    pub fn dependents(&self, module: usize) -> usize {
        let mut others: Vec<usize> = self
            .dependencies
            .iter()
            .filter_map(|d| {
                if d.source == module && d.destination != module {
                    Some(d.destination)
                } else if d.destination == module && d.source != module {
                    Some(d.source)
                } else {
                    None
                }
            })
            .collect();
        others.sort_unstable();
        others.dedup();
        others.len()
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    pub fn module_index(&self, name: &str) -> Option<usize> {
        self.modules.iter().position(|m| m.name == name)
    }
}
