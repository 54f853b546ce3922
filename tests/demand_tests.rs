//! Demand propagation and model extraction over whole applications.


use fogplace_core::prelude::*;
use fogplace_model::{extract, ModuleKind};
use scenario_data::{control_app, three_tier_topology, two_node_topology, vision_app};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn selectivity_scales_downstream_rates() {
    let m = extract(&three_tier_topology(), &[vision_app()], None, &OptimizerConfig::default()).unwrap();
    let client = m.module_index("client").unwrap();
    let detector = m.module_index("detector").unwrap();
    let cam = m.module_index("cam").unwrap();
    let screen = m.module_index("screen").unwrap();

    // Uniform(0.5, 1.5) → one frame every 0.5 s in the worst case.
    assert!(close(m.modules[client].mips, 2.0 * 10.0 + 1.0 * 5.0));
    assert!(close(m.modules[detector].mips, 2.0 * 300.0));
    assert_eq!(m.modules[cam].kind, ModuleKind::Sensor);
    assert_eq!(m.modules[screen].mips, 0.0);

    let dep = |a, b| m.dependencies[m.dependency_index(a, b).unwrap()];
    assert!(close(dep(cam, client).rate, 2.0));
    assert_eq!(dep(cam, client).bandwidth, 0.0);
    assert!(close(dep(client, detector).bandwidth, 40.0));
    assert!(close(dep(detector, client).rate, 1.0));
    assert!(close(dep(client, screen).bandwidth, 0.5));
}

#[test]
fn loops_expand_over_every_matching_sensor() {
    let mut topo = three_tier_topology();
    let mut second = topo.sensors[0].clone();
    second.name = "cam2".into();
    topo.sensors.push(second);

    let m = extract(&topo, &[vision_app()], None, &OptimizerConfig::default()).unwrap();
    assert_eq!(m.loops.len(), 2);
    let client = m.module_index("client").unwrap();
    let detector = m.module_index("detector").unwrap();
    let dep = m.dependencies[m.dependency_index(client, detector).unwrap()];
    assert!(close(dep.rate, 4.0));
    assert!(close(m.modules[detector].mips, 1200.0));
}

#[test]
fn client_modules_pin_to_their_device_gateway() {
    let m = extract(&three_tier_topology(), &[vision_app()], None, &OptimizerConfig::default()).unwrap();
    let client = m.module_index("client").unwrap();
    let detector = m.module_index("detector").unwrap();
    assert_eq!(m.candidate_nodes(client).collect::<Vec<_>>(), vec![m.node_index("edge").unwrap()]);
    assert_eq!(m.candidate_nodes(detector).count(), 3);
}

#[test]
fn emissions_after_an_edge_is_charged_are_dropped() {
    // The periodic "A" emission is popped before the sensor's "Z" produces
    // more "A" tuples; the later batch is not charged.
    let app = Application::new(9)
        .with_module(AppModule::new("m1", 1.0, 1.0).map("Z", "A", 1.0))
        .with_module(AppModule::new("m2", 1.0, 1.0))
        .with_edge(AppEdge::new(EdgeKind::Sensor, "TEMP", "m1", "Z", 1.0, 1.0))
        .with_edge(AppEdge::new(EdgeKind::Module, "m1", "m2", "A", 10.0, 1.0).periodic(2.0));
    let m = extract(&two_node_topology(), &[app], None, &OptimizerConfig::default()).unwrap();
    let m2 = m.module_index("m2").unwrap();
    assert!(close(m.modules[m2].mips, 0.5 * 10.0));
}

#[test]
fn global_modules_merge_across_applications() {
    let shared = |id: u64, name: &str| {
        Application::new(id)
            .with_module(AppModule::new(name, 5.0, 5.0).map("TEMP", "LOG", 1.0))
            .with_module(AppModule::new("store", 50.0, 100.0).global())
            .with_edge(AppEdge::new(EdgeKind::Sensor, "TEMP", name, "TEMP", 5.0, 1.0))
            .with_edge(AppEdge::new(EdgeKind::Module, name, "store", "LOG", 2.0, 1.0))
    };
    let m = extract(
        &two_node_topology(),
        &[shared(1, "ingest_a"), shared(2, "ingest_b")],
        None,
        &OptimizerConfig::default(),
    )
    .unwrap();
    let store = m.module_index("store").unwrap();
    assert_eq!(m.modules.iter().filter(|x| x.name == "store").count(), 1);
    assert!(close(m.modules[store].mips, 2.0 * 2.0));
    assert_eq!((m.modules[store].ram, m.modules[store].storage), (100.0, 200.0));
    assert_eq!(m.dependencies.iter().filter(|d| d.destination == store).count(), 2);
}

#[test]
fn unknown_references_are_model_errors() {
    let app = control_app(50.0, 20.0).with_edge(AppEdge::new(EdgeKind::Module, "ghost", "control", "X", 1.0, 1.0));
    // "X" is never emitted, so the edge is only reported; a loop naming a
    // missing module is an error.
    assert!(extract(&two_node_topology(), &[app], None, &OptimizerConfig::default()).is_ok());

    let app = control_app(50.0, 20.0).with_loop(&["filter", "nowhere"], 1.0);
    let err = extract(&two_node_topology(), &[app], None, &OptimizerConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Model(_)));
}
