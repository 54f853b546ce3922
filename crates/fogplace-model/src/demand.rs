//! Worst-case demand propagation through an application's tuple graph.
//!
//! Every sensor (and every periodic edge) seeds the work list with its
//! worst-case inter-emission interval at probability 1. Tuple types are
//! then popped in lexicographic order; each pop resolves the edge that
//! carries the type, charges its rate/CPU/network demand, and pushes the
//! tuple types the receiving module emits in response (scaled by the
//! selectivity fraction). Each edge is charged exactly once.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use fogplace_core::application::{AppEdge, Application, EdgeKind};
use fogplace_core::error::{Error, Result};

/// A sensor as seen by propagation.
#[derive(Debug, Clone)]
pub struct SensorEndpoint {
    pub module: usize,
    pub tuple_type: String,
    /// Worst-case inter-emission time (seconds, > 0).
    pub interval: f64,
}

#[derive(Debug, Clone)]
pub struct ActuatorEndpoint {
    pub module: usize,
    pub actuator_type: String,
}

/// Name resolution shared by every application of one extraction.
#[derive(Debug, Clone, Default)]
pub struct Endpoints {
    pub modules: HashMap<String, usize>,
    pub sensors: Vec<SensorEndpoint>,
    pub actuators: Vec<ActuatorEndpoint>,
}

impl Endpoints {
    fn module(&self, name: &str, edge: &AppEdge) -> Result<usize> {
        self.modules.get(name).copied().ok_or_else(|| {
            Error::Model(format!(
                "edge carrying '{}' references unknown module '{name}'",
                edge.tuple_type
            ))
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Flow {
    pub rate: f64,
    pub bandwidth: f64,
}

/// Accumulated demand, indexed like the model's module list.
#[derive(Debug, Clone, Default)]
pub struct DemandTable {
    pub mips: Vec<f64>,
    pub bandwidth: Vec<f64>,
    /// (source module, destination module) → aggregate flow.
    pub flows: BTreeMap<(usize, usize), Flow>,
}

impl DemandTable {
    pub fn new(num_modules: usize) -> Self {
        Self {
            mips: vec![0.0; num_modules],
            bandwidth: vec![0.0; num_modules],
            flows: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Emission {
    interval: f64,
    probability: f64,
    /// Emitting sensor module, for sensor tuples.
    origin: Option<usize>,
}

/// Propagate one application's demand into `table`.
pub fn propagate(app: &Application, endpoints: &Endpoints, table: &mut DemandTable) -> Result<()> {
    let mut carrier: HashMap<&str, usize> = HashMap::new();
    for (i, e) in app.edges.iter().enumerate() {
        if carrier.insert(e.tuple_type.as_str(), i).is_some() {
            return Err(Error::Model(format!(
                "{}: tuple type '{}' is carried by more than one edge",
                app.id, e.tuple_type
            )));
        }
    }

    let mut pending: BTreeMap<String, Vec<Emission>> = BTreeMap::new();
    for e in &app.edges {
        if e.kind == EdgeKind::Sensor {
            for s in endpoints.sensors.iter().filter(|s| s.tuple_type == e.source) {
                pending.entry(e.tuple_type.clone()).or_default().push(Emission {
                    interval: s.interval,
                    probability: 1.0,
                    origin: Some(s.module),
                });
            }
        }
        if let Some(period) = e.periodicity {
            if !(period > 0.0) {
                return Err(Error::Model(format!(
                    "{}: periodic edge '{}' has non-positive period {period}",
                    app.id, e.tuple_type
                )));
            }
            pending.entry(e.tuple_type.clone()).or_default().push(Emission {
                interval: period,
                probability: 1.0,
                origin: None,
            });
        }
    }

    let mut visited = vec![false; app.edges.len()];

    while let Some((tuple_type, emissions)) = pending.pop_first() {
        let Some(&ei) = carrier.get(tuple_type.as_str()) else {
            debug!(app = %app.id, %tuple_type, "tuple type has no carrying edge");
            continue;
        };
        if std::mem::replace(&mut visited[ei], true) {
            debug!(
                app = %app.id,
                %tuple_type,
                dropped = emissions.len(),
                "edge already charged; late emissions dropped"
            );
            continue;
        }
        let edge = &app.edges[ei];

        let destinations: Vec<usize> = match edge.kind {
            EdgeKind::Actuator => endpoints
                .actuators
                .iter()
                .filter(|a| a.actuator_type == edge.destination)
                .map(|a| a.module)
                .collect(),
            EdgeKind::Sensor | EdgeKind::Module => vec![endpoints.module(&edge.destination, edge)?],
        };
        if destinations.is_empty() {
            warn!(app = %app.id, actuator_type = %edge.destination, "no actuator of this type");
        }

        for em in &emissions {
            let source = match (edge.kind, em.origin) {
                (EdgeKind::Sensor, Some(sensor)) => sensor,
                (EdgeKind::Sensor, None) if edge.periodicity.is_some() => {
                    return Err(Error::Model(format!(
                        "{}: sensor edge '{}' cannot be periodic",
                        app.id, edge.tuple_type
                    )))
                }
                (EdgeKind::Sensor, None) => {
                    return Err(Error::Model(format!(
                        "{}: module output '{}' is reserved for sensor input",
                        app.id, edge.tuple_type
                    )))
                }
                _ => endpoints.module(&edge.source, edge)?,
            };
            let rate = em.probability / em.interval;

            for &dst in &destinations {
                let flow = table.flows.entry((source, dst)).or_default();
                flow.rate += rate;
                if edge.kind != EdgeKind::Actuator {
                    table.mips[dst] += rate * edge.tuple_cpu_length;
                }
                if edge.kind != EdgeKind::Sensor {
                    let bw = rate * edge.tuple_nw_length;
                    flow.bandwidth += bw;
                    table.bandwidth[dst] += bw;
                }
            }

            if edge.kind == EdgeKind::Actuator {
                continue;
            }
            if let Some(module) = app.module(&edge.destination) {
                for m in module.selectivity.iter().filter(|m| m.input == tuple_type) {
                    pending.entry(m.output.clone()).or_default().push(Emission {
                        interval: em.interval,
                        probability: em.probability * m.fraction,
                        origin: None,
                    });
                }
            }
        }
    }

    for (e, _) in app.edges.iter().zip(&visited).filter(|(_, v)| !**v) {
        warn!(app = %app.id, tuple_type = %e.tuple_type, "edge never receives tuples; zero demand");
    }

    Ok(())
}
