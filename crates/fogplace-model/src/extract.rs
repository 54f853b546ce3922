//! Topology & application extraction.
//!
//! Turns the externally supplied object graph into dense arrays: nodes and
//! modules get matrix indices, links become latency/bandwidth matrices,
//! pinning rules become the `possible_deployment` mask, and demand
//! propagation fills in per-module and per-dependency worst-case figures.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info};

use fogplace_core::application::Application;
use fogplace_core::config::OptimizerConfig;
use fogplace_core::error::{Error, Result};
use fogplace_core::id::NodeId;
use fogplace_core::matrix::Matrix;
use fogplace_core::topology::{PreviousPlacement, Topology};

use crate::demand::{propagate, ActuatorEndpoint, DemandTable, Endpoints, SensorEndpoint};
use crate::model::{Dependency, LoopSpec, ModuleInfo, ModuleKind, NodeInfo, PlacementModel, Scales};
use crate::reach::HopIndex;

/// Build the numeric model for one optimization run.
pub fn extract(
    topology: &Topology,
    applications: &[Application],
    previous: Option<&PreviousPlacement>,
    config: &OptimizerConfig,
) -> Result<PlacementModel> {
    let node_index = index_nodes(topology)?;
    let nodes = node_infos(topology)?;
    let (latency, bandwidth) = link_matrices(topology, &node_index)?;

    let mut modules: Vec<ModuleInfo> = Vec::new();
    let mut owners: Vec<BTreeSet<usize>> = Vec::new();
    let mut endpoints = Endpoints::default();
    // Pin target of sensor/actuator modules.
    let mut gateway: Vec<Option<usize>> = Vec::new();

    for (ai, app) in applications.iter().enumerate() {
        for m in &app.modules {
            if m.ram < 0.0 || m.storage < 0.0 {
                return Err(Error::Model(format!("module '{}' has negative size", m.name)));
            }
            if let Some(deadline) = m.migration_deadline {
                if !(deadline >= 0.0) {
                    return Err(Error::Model(format!(
                        "module '{}' has invalid migration deadline {deadline}",
                        m.name
                    )));
                }
            }
            if let Some(&existing) = endpoints.modules.get(&m.name) {
                let shared = &mut modules[existing];
                if !(m.is_global && shared.is_global) {
                    return Err(Error::Model(format!("duplicate module name '{}'", m.name)));
                }
                shared.ram += m.ram;
                shared.storage += m.storage;
                shared.is_client |= m.is_client;
                owners[existing].insert(ai);
                continue;
            }
            endpoints.modules.insert(m.name.clone(), modules.len());
            modules.push(ModuleInfo {
                name: m.name.clone(),
                kind: ModuleKind::Service,
                mips: 0.0,
                ram: m.ram,
                storage: m.storage,
                bandwidth: 0.0,
                is_client: m.is_client,
                is_global: m.is_global,
                migration_deadline: m.migration_deadline.unwrap_or(config.default_migration_deadline),
                endpoint_latency: 0.0,
            });
            owners.push(BTreeSet::from([ai]));
            gateway.push(None);
        }
    }

    for s in &topology.sensors {
        let interval = s.emission.worst_case_interval();
        if !(interval > 0.0) || !interval.is_finite() {
            return Err(Error::Model(format!(
                "sensor '{}' has non-positive worst-case interval {interval}",
                s.name
            )));
        }
        let idx = push_endpoint(&mut modules, &mut endpoints, &s.name, ModuleKind::Sensor, s.latency)?;
        endpoints.sensors.push(SensorEndpoint {
            module: idx,
            tuple_type: s.tuple_type.clone(),
            interval,
        });
        gateway.push(Some(resolve_node(&node_index, s.gateway, &s.name)?));
        owners.push(BTreeSet::new());
    }

    for a in &topology.actuators {
        let idx = push_endpoint(&mut modules, &mut endpoints, &a.name, ModuleKind::Actuator, a.latency)?;
        endpoints.actuators.push(ActuatorEndpoint {
            module: idx,
            actuator_type: a.actuator_type.clone(),
        });
        gateway.push(Some(resolve_node(&node_index, a.gateway, &a.name)?));
        owners.push(BTreeSet::new());
    }

    let mut demand = DemandTable::new(modules.len());
    for app in applications {
        propagate(app, &endpoints, &mut demand)?;
    }
    for (i, m) in modules.iter_mut().enumerate() {
        if m.kind == ModuleKind::Service {
            m.mips = demand.mips[i];
        }
        m.bandwidth = demand.bandwidth[i];
    }

    let dependencies: Vec<Dependency> = demand
        .flows
        .iter()
        .filter(|(_, f)| f.rate > 0.0)
        .map(|(&(source, destination), f)| Dependency {
            source,
            destination,
            rate: f.rate,
            bandwidth: f.bandwidth,
        })
        .collect();

    let client_nodes: Vec<BTreeSet<usize>> = applications
        .iter()
        .map(|app| client_devices(app, &endpoints, &gateway))
        .collect();

    let n = nodes.len();
    let mut possible_deployment = Matrix::filled(n, modules.len(), 0u8);
    for (mi, m) in modules.iter().enumerate() {
        let allowed: BTreeSet<usize> = match gateway[mi] {
            Some(g) => BTreeSet::from([g]),
            None if m.is_client => owners[mi]
                .iter()
                .flat_map(|&ai| client_nodes[ai].iter().copied())
                .collect(),
            None => (0..n).collect(),
        };
        if allowed.is_empty() {
            return Err(Error::Model(format!(
                "client module '{}' has no client device (no sensor or actuator gateway)",
                m.name
            )));
        }
        for node in allowed {
            possible_deployment[(node, mi)] = 1;
        }
    }

    let current_placement = match previous {
        Some(prev) => current_matrix(prev, &modules, &gateway, &node_index)?,
        None => None,
    };

    let mut model = PlacementModel {
        hops: HopIndex::build(&latency),
        scales: Scales::default(),
        nodes,
        modules,
        latency,
        bandwidth,
        dependencies,
        loops: Vec::new(),
        possible_deployment,
        current_placement,
    };
    model.loops = resolve_loops(applications, &model, &endpoints)?;
    model.scales = scales(&model);

    info!(
        nodes = model.num_nodes(),
        modules = model.num_modules(),
        dependencies = model.dependencies.len(),
        loops = model.loops.len(),
        migrating = model.current_placement.is_some(),
        "extracted placement model"
    );

    Ok(model)
}

fn index_nodes(topology: &Topology) -> Result<HashMap<NodeId, usize>> {
    let mut index = HashMap::with_capacity(topology.nodes.len());
    let mut names = BTreeSet::new();
    for (i, node) in topology.nodes.iter().enumerate() {
        if index.insert(node.id, i).is_some() {
            return Err(Error::Model(format!("duplicate node id {}", node.id)));
        }
        if !names.insert(node.name.as_str()) {
            return Err(Error::Model(format!("duplicate node name '{}'", node.name)));
        }
    }
    Ok(index)
}

fn node_infos(topology: &Topology) -> Result<Vec<NodeInfo>> {
    topology
        .nodes
        .iter()
        .map(|n| {
            if !(n.mips > 0.0 && n.ram > 0.0 && n.storage > 0.0) {
                return Err(Error::Model(format!(
                    "node '{}' must have positive mips/ram/storage",
                    n.name
                )));
            }
            Ok(NodeInfo {
                id: n.id,
                name: n.name.clone(),
                mips: n.mips,
                ram: n.ram,
                storage: n.storage,
                busy_power: n.busy_power,
                idle_power: n.idle_power,
                price: n.price,
            })
        })
        .collect()
}

fn link_matrices(
    topology: &Topology,
    index: &HashMap<NodeId, usize>,
) -> Result<(Matrix<f64>, Matrix<f64>)> {
    let n = topology.nodes.len();
    let mut latency = Matrix::filled(n, n, f64::INFINITY);
    let mut bandwidth = Matrix::filled(n, n, 0.0);
    for (i, node) in topology.nodes.iter().enumerate() {
        latency[(i, i)] = 0.0;
        for link in &node.neighbors {
            let j = resolve_node(index, link.node, &node.name)?;
            if i == j {
                continue;
            }
            if !(link.latency >= 0.0 && link.latency.is_finite() && link.bandwidth > 0.0) {
                return Err(Error::Model(format!(
                    "link {} -> {} needs finite latency and positive bandwidth",
                    node.name, topology.nodes[j].name
                )));
            }
            latency[(i, j)] = link.latency;
            bandwidth[(i, j)] = link.bandwidth;
        }
    }
    Ok((latency, bandwidth))
}

fn resolve_node(index: &HashMap<NodeId, usize>, id: NodeId, referrer: &str) -> Result<usize> {
    index
        .get(&id)
        .copied()
        .ok_or_else(|| Error::Model(format!("'{referrer}' references unknown node {id}")))
}

fn push_endpoint(
    modules: &mut Vec<ModuleInfo>,
    endpoints: &mut Endpoints,
    name: &str,
    kind: ModuleKind,
    latency: f64,
) -> Result<usize> {
    if endpoints.modules.contains_key(name) {
        return Err(Error::Model(format!("duplicate module name '{name}'")));
    }
    let idx = modules.len();
    endpoints.modules.insert(name.to_string(), idx);
    modules.push(ModuleInfo {
        name: name.to_string(),
        kind,
        mips: 0.0,
        ram: 0.0,
        storage: 0.0,
        bandwidth: 0.0,
        is_client: false,
        is_global: false,
        migration_deadline: f64::INFINITY,
        endpoint_latency: latency,
    });
    Ok(idx)
}

/// Gateways of the sensors and actuators an application talks to.
fn client_devices(app: &Application, endpoints: &Endpoints, gateway: &[Option<usize>]) -> BTreeSet<usize> {
    let sensors = app.sensor_types().flat_map(|t| {
        endpoints
            .sensors
            .iter()
            .filter(move |s| s.tuple_type == t)
            .map(|s| s.module)
    });
    let actuators = app.actuator_types().flat_map(|t| {
        endpoints
            .actuators
            .iter()
            .filter(move |a| a.actuator_type == t)
            .map(|a| a.module)
    });
    sensors
        .chain(actuators)
        .filter_map(|m| gateway[m])
        .collect()
}

fn current_matrix(
    prev: &PreviousPlacement,
    modules: &[ModuleInfo],
    gateway: &[Option<usize>],
    index: &HashMap<NodeId, usize>,
) -> Result<Option<Matrix<u8>>> {
    let mut cur = Matrix::filled(index.len(), modules.len(), 0u8);
    for (mi, m) in modules.iter().enumerate() {
        let node = match (prev.get(&m.name), gateway[mi]) {
            (Some(id), _) => resolve_node(index, id, &m.name)?,
            (None, Some(g)) => g,
            (None, None) => {
                debug!(module = %m.name, "no previous node; treating run as first placement");
                return Ok(None);
            }
        };
        cur[(node, mi)] = 1;
    }
    Ok(Some(cur))
}

fn resolve_loops(
    applications: &[Application],
    model: &PlacementModel,
    endpoints: &Endpoints,
) -> Result<Vec<LoopSpec>> {
    let mut loops = Vec::new();
    for app in applications {
        for lp in &app.loops {
            let mut choices: Vec<Vec<usize>> = Vec::with_capacity(lp.modules.len());
            for entry in &lp.modules {
                let options: Vec<usize> = if let Some(&m) = endpoints.modules.get(entry) {
                    vec![m]
                } else {
                    endpoints
                        .sensors
                        .iter()
                        .filter(|s| &s.tuple_type == entry)
                        .map(|s| s.module)
                        .chain(
                            endpoints
                                .actuators
                                .iter()
                                .filter(|a| &a.actuator_type == entry)
                                .map(|a| a.module),
                        )
                        .collect()
                };
                if options.is_empty() {
                    return Err(Error::Model(format!("loop entry '{entry}' matches no module")));
                }
                choices.push(options);
            }

            for chain in cartesian(&choices) {
                let mut deps = Vec::with_capacity(chain.len().saturating_sub(1));
                for pair in chain.windows(2) {
                    let d = model.dependency_index(pair[0], pair[1]).ok_or_else(|| {
                        Error::Model(format!(
                            "loop step {} -> {} has no dependency",
                            model.modules[pair[0]].name, model.modules[pair[1]].name
                        ))
                    })?;
                    deps.push(d);
                }
                let fixed_latency = chain
                    .iter()
                    .filter(|&&m| model.modules[m].kind != ModuleKind::Service)
                    .map(|&m| model.modules[m].endpoint_latency)
                    .sum();
                loops.push(LoopSpec {
                    modules: chain,
                    deps,
                    deadline: lp.deadline,
                    fixed_latency,
                });
            }
        }
    }
    Ok(loops)
}

fn cartesian(choices: &[Vec<usize>]) -> Vec<Vec<usize>> {
    choices.iter().fold(vec![Vec::new()], |acc, options| {
        acc.into_iter()
            .flat_map(|prefix| {
                options.iter().map(move |&o| {
                    let mut next = prefix.clone();
                    next.push(o);
                    next
                })
            })
            .collect()
    })
}

fn scales(model: &PlacementModel) -> Scales {
    let n = model.num_nodes();
    let links = move || {
        (0..n)
            .flat_map(move |i| (0..n).map(move |j| (i, j)))
            .filter(move |&(i, j)| model.has_link(i, j))
    };
    Scales {
        mips: Scales::finite_max(model.nodes.iter().map(|n| n.mips)),
        ram: Scales::finite_max(model.nodes.iter().map(|n| n.ram)),
        storage: Scales::finite_max(model.nodes.iter().map(|n| n.storage)),
        bandwidth: Scales::finite_max(links().map(|(i, j)| model.bandwidth[(i, j)])),
        latency: Scales::finite_max(links().map(|(i, j)| model.latency[(i, j)])),
        power_delta: Scales::finite_max(model.nodes.iter().map(|n| n.power_delta())),
        module_size: Scales::finite_max(model.modules.iter().map(|m| m.size())),
    }
}
