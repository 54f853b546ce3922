//! Shared fixtures for unit tests: the two-node cloud/edge scenario.

use fogplace_core::prelude::*;
use fogplace_model::{extract, PlacementModel};

use crate::candidate::Candidate;

pub fn topology() -> Topology {
    let mut t = Topology::default();
    let cloud = t.add_node(
        Node::new(1, "cloud", 1000.0, f64::INFINITY, f64::INFINITY)
            .with_power(1648.0, 1332.0)
            .with_price(ResourcePrice { mips: 0.01, ..Default::default() }),
    );
    let edge = t.add_node(
        Node::new(2, "edge", 100.0, 1000.0, 1000.0)
            .with_power(87.53, 82.44)
            .with_price(ResourcePrice { mips: 0.001, ..Default::default() }),
    );
    t.connect(cloud, edge, 0.01, 100.0);
    t.sensors.push(Sensor {
        name: "s".into(),
        tuple_type: "RAW".into(),
        gateway: edge,
        emission: Distribution::Deterministic { value: 1.0 },
        latency: 0.0,
    });
    t.actuators.push(Actuator {
        name: "act".into(),
        actuator_type: "DISPLAY".into(),
        gateway: edge,
        latency: 0.0,
    });
    t
}

/// `s → a → b → act`, demands a = `cpu_a`, b = `cpu_b` MIPS.
pub fn application(cpu_a: f64, cpu_b: f64) -> Application {
    Application::new(1)
        .with_module(AppModule::new("a", 10.0, 10.0).map("RAW", "MID", 1.0))
        .with_module(AppModule::new("b", 10.0, 10.0).map("MID", "OUT", 1.0))
        .with_edge(AppEdge::new(EdgeKind::Sensor, "RAW", "a", "RAW", cpu_a, 1.0))
        .with_edge(AppEdge::new(EdgeKind::Module, "a", "b", "MID", cpu_b, 1.0))
        .with_edge(AppEdge::new(EdgeKind::Actuator, "b", "DISPLAY", "OUT", 0.0, 0.1))
        .with_loop(&["RAW", "a", "b", "DISPLAY"], 10.0)
}

pub fn model(config: &OptimizerConfig) -> PlacementModel {
    extract(&topology(), &[application(50.0, 20.0)], None, config).unwrap()
}

pub fn index(model: &PlacementModel, module: &str, node: &str) -> (usize, usize) {
    (model.module_index(module).unwrap(), model.node_index(node).unwrap())
}

/// Place `a`/`b` and lay out the only admissible routes on two nodes.
pub fn layout(model: &PlacementModel, a_node: &str, b_node: &str) -> Candidate {
    let mut cand = Candidate::empty(model);
    let (a, na) = index(model, "a", a_node);
    let (b, nb) = index(model, "b", b_node);
    let (s, edge) = index(model, "s", "edge");
    let (act, _) = index(model, "act", "edge");
    for (m, n) in [(a, na), (b, nb), (s, edge), (act, edge)] {
        cand.placement[(n, m)] = 1;
    }
    let hosts = cand.hosts();
    for (d, dep) in model.dependencies.iter().enumerate() {
        let row = cand.tuple_routing.row_mut(d);
        row[0] = hosts[dep.source].unwrap();
        row[1] = hosts[dep.destination].unwrap();
    }
    for m in 0..model.num_modules() {
        let host = hosts[m].unwrap();
        let origin = model.previous_node(m).unwrap_or(host);
        let row = cand.migration_routing.row_mut(m);
        row[0] = origin;
        row[1] = host;
    }
    cand
}
