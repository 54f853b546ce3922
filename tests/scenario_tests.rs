//! End-to-end optimization scenarios on small cloud/edge topologies.


use fogplace_core::prelude::*;
use fogplace_solver::verify::{assert_hops_follow_links, assert_route_endpoints, assert_single_placement};
use fogplace_solver::{optimize, Outcome};
use scenario_data::{control_app, three_tier_topology, two_node_topology, vision_app};

fn names(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[test]
fn colocates_on_edge_when_capacity_allows() {
    let run = optimize(&two_node_topology(), &[control_app(50.0, 20.0)], None, &OptimizerConfig::default())
        .expect("optimize");
    let plan = run.plan.expect("feasible plan");

    assert!(plan.feasible);
    assert_eq!(plan.placement.len(), 1);
    assert_eq!(plan.placement["edge"], names(&["filter", "control", "thermo", "valve"]));
    assert!(plan.routing.iter().all(|r| r.hops == names(&["edge"])));
    assert!(plan.migration.is_empty());
    assert!((plan.operational_price - 0.07).abs() < 1e-9);
    assert_eq!(run.stats.iterations, 4);

    let best = run.outcome.solution().unwrap();
    assert_single_placement(&run.model, best.candidate());
    assert_route_endpoints(&run.model, best.candidate());
    assert_hops_follow_links(&run.model, best.candidate());
}

#[test]
fn splits_across_the_link_under_a_tight_ceiling() {
    let config = OptimizerConfig {
        mips_ceiling: 0.6,
        ..OptimizerConfig::default()
    };
    let run = optimize(&two_node_topology(), &[control_app(50.0, 20.0)], None, &config).unwrap();
    let plan = run.plan.unwrap();

    assert_eq!(plan.placement["edge"], names(&["filter", "thermo", "valve"]));
    assert_eq!(plan.placement["cloud"], names(&["control"]));
    let hop = |src: &str, dst: &str| {
        plan.routing
            .iter()
            .find(|r| r.source == src && r.destination == dst)
            .map(|r| r.hops.clone())
            .unwrap()
    };
    assert_eq!(hop("filter", "control"), names(&["edge", "cloud"]));
    assert_eq!(hop("control", "valve"), names(&["cloud", "edge"]));
    // hosting 0.001*50 + 0.01*20, transfer 0.01*1 + 0.05*0.1
    assert!((plan.operational_price - 0.265).abs() < 1e-9);
}

#[test]
fn overloaded_client_device_has_no_placement() {
    let mut app = control_app(90.0, 90.0);
    for m in &mut app.modules {
        m.is_client = true;
    }
    let run = optimize(&two_node_topology(), &[app], None, &OptimizerConfig::default()).unwrap();
    assert_eq!(run.outcome, Outcome::NoFeasiblePlacement);
    assert!(run.plan.is_none());
    assert!(run.manifest.plan_hash.is_none());
    assert_eq!(run.stats.feasible, 0);
}

#[test]
fn migrates_when_cheap_and_stays_when_deadline_is_short() {
    let mut prev = PreviousPlacement::default();
    prev.insert("filter", NodeId::new(1));
    prev.insert("control", NodeId::new(2));

    let run = optimize(&two_node_topology(), &[control_app(50.0, 20.0)], Some(&prev), &OptimizerConfig::default())
        .unwrap();
    let plan = run.plan.unwrap();
    assert_eq!(plan.migration.len(), 1);
    assert_eq!(plan.migration["filter"], names(&["cloud", "edge"]));
    assert!(plan.cost.get(Objective::Migration) > 0.0);

    // 0.01 s + 20 MB at 20 MB/s + 0.5 s setup exceeds one second.
    let mut app = control_app(50.0, 20.0);
    app.modules[0].migration_deadline = Some(1.0);
    let run = optimize(&two_node_topology(), &[app], Some(&prev), &OptimizerConfig::default()).unwrap();
    let plan = run.plan.unwrap();
    assert_eq!(plan.placement["cloud"], names(&["filter"]));
    assert!(plan.migration.is_empty());
    assert_eq!(plan.cost.get(Objective::Migration), 0.0);
}

#[test]
fn partial_previous_placement_is_a_first_run() {
    let mut prev = PreviousPlacement::default();
    prev.insert("filter", NodeId::new(1));
    let run = optimize(&two_node_topology(), &[control_app(50.0, 20.0)], Some(&prev), &OptimizerConfig::default())
        .unwrap();
    assert!(run.model.current_placement.is_none());
    assert!(run.plan.unwrap().migration.is_empty());
}

#[test]
fn heavy_detector_goes_to_the_cloud_over_the_fog_tier() {
    let run = optimize(&three_tier_topology(), &[vision_app()], None, &OptimizerConfig::default()).unwrap();
    let plan = run.plan.unwrap();

    assert_eq!(plan.placement["cloud"], names(&["detector"]));
    assert!(plan.placement["edge"].contains(&"client".to_string()));
    let up = plan
        .routing
        .iter()
        .find(|r| r.source == "client" && r.destination == "detector")
        .unwrap();
    assert_eq!(up.hops, names(&["edge", "fog", "cloud"]));
    assert_eq!(plan.cost.get(Objective::Qos), 0.0);
}

#[test]
fn manifest_hashes_are_stable_across_runs() {
    let config = OptimizerConfig::default();
    let first = optimize(&two_node_topology(), &[control_app(50.0, 20.0)], None, &config).unwrap();
    let second = optimize(&two_node_topology(), &[control_app(50.0, 20.0)], None, &config).unwrap();

    assert_eq!(first.manifest.model_hash, second.manifest.model_hash);
    assert_eq!(first.manifest.plan_hash, second.manifest.plan_hash);
    assert!(first.manifest.plan_hash.is_some());
    assert_ne!(first.manifest.id, second.manifest.id);
    assert_eq!(first.manifest.iterations, first.stats.iterations);
    assert_eq!(first.manifest.engine_version, fogplace_core::VERSION);
}

#[test]
fn yaml_policy_drives_the_search() {
    let config = OptimizerConfig::from_yaml_str("mips_ceiling: 0.6\ntolerance: 0.0\n").unwrap();
    let run = optimize(&two_node_topology(), &[control_app(50.0, 20.0)], None, &config).unwrap();
    assert_eq!(run.plan.unwrap().placement["cloud"], names(&["control"]));
}

#[test]
fn invalid_config_is_rejected_before_extraction() {
    let config = OptimizerConfig {
        mips_ceiling: 1.5,
        ..OptimizerConfig::default()
    };
    let err = optimize(&two_node_topology(), &[control_app(50.0, 20.0)], None, &config).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn plan_serializes_with_node_names() {
    let run = optimize(&two_node_topology(), &[control_app(50.0, 20.0)], None, &OptimizerConfig::default())
        .unwrap();
    let json = serde_json::to_value(run.plan.as_ref().unwrap()).unwrap();
    assert_eq!(json["placement"]["edge"][0], "filter");
    assert_eq!(json["feasible"], true);
}
