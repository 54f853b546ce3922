//! Property tests over small random topologies.


use std::cmp::Ordering;

use proptest::prelude::*;

use fogplace_core::prelude::*;
use fogplace_model::{extract, PlacementModel};
use fogplace_solver::verify::{assert_hops_follow_links, assert_route_endpoints, assert_single_placement};
use fogplace_solver::{CostVector, ExhaustiveSolver, Ranking};
use scenario_data::control_app;

#[derive(Debug, Clone)]
struct Case {
    mips: Vec<f64>,
    shortcut: bool,
    cpu: (f64, f64),
}

fn arb_case() -> impl Strategy<Value = Case> {
    (
        prop::collection::vec(50.0f64..500.0, 2..=3),
        any::<bool>(),
        1.0f64..120.0,
        1.0f64..120.0,
    )
        .prop_map(|(mips, shortcut, a, b)| Case {
            mips,
            shortcut,
            cpu: (a, b),
        })
}

fn topology(case: &Case) -> Topology {
    let mut t = Topology::default();
    let ids: Vec<NodeId> = case
        .mips
        .iter()
        .enumerate()
        .map(|(i, &mips)| {
            t.add_node(
                Node::new(i as u64 + 1, format!("n{i}"), mips, 1000.0, 1000.0)
                    .with_power(100.0 + 20.0 * i as f64, 80.0),
            )
        })
        .collect();
    for pair in ids.windows(2) {
        t.connect(pair[0], pair[1], 0.01, 100.0);
    }
    if case.shortcut && ids.len() == 3 {
        t.connect(ids[0], ids[2], 0.05, 20.0);
    }
    let gateway = ids[ids.len() - 1];
    t.sensors.push(Sensor {
        name: "thermo".into(),
        tuple_type: "TEMP".into(),
        gateway,
        emission: Distribution::Deterministic { value: 1.0 },
        latency: 0.0,
    });
    t.actuators.push(Actuator {
        name: "valve".into(),
        actuator_type: "VALVE".into(),
        gateway,
        latency: 0.0,
    });
    t
}

fn model(case: &Case, config: &OptimizerConfig) -> PlacementModel {
    extract(&topology(case), &[control_app(case.cpu.0, case.cpu.1)], None, config).unwrap()
}

fn with_ceiling(c: f64) -> OptimizerConfig {
    OptimizerConfig {
        mips_ceiling: c,
        ram_ceiling: c,
        storage_ceiling: c,
        bandwidth_ceiling: c,
        ..OptimizerConfig::default()
    }
}

fn arb_cost() -> impl Strategy<Value = CostVector> {
    let value = prop_oneof![Just(0.0), 0.0f64..10.0, 1e-6f64..1e-3];
    prop::array::uniform5(value).prop_map(CostVector)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 48, ..ProptestConfig::default() })]

    #[test]
    fn best_solution_is_structurally_sound(case in arb_case(), c in 0.2f64..1.0) {
        let config = with_ceiling(c);
        let m = model(&case, &config);
        let report = ExhaustiveSolver::new(&m, &config).solve().unwrap();
        if let Some(best) = report.outcome.solution() {
            prop_assert!(best.is_feasible());
            assert_single_placement(&m, best.candidate());
            assert_route_endpoints(&m, best.candidate());
            assert_hops_follow_links(&m, best.candidate());
        }
        prop_assert!(report.stats.feasible <= report.stats.iterations);
    }

    #[test]
    fn raising_ceilings_keeps_feasibility(case in arb_case(), c in 0.2f64..0.9, bump in 0.0f64..0.1) {
        let low = with_ceiling(c);
        let high = with_ceiling(c + bump);
        let m = model(&case, &low);
        let tight = ExhaustiveSolver::new(&m, &low).solve().unwrap();
        let loose = ExhaustiveSolver::new(&m, &high).solve().unwrap();
        prop_assert!(loose.stats.feasible >= tight.stats.feasible);
        if tight.outcome.is_feasible() {
            prop_assert!(loose.outcome.is_feasible());
        }
    }

    #[test]
    fn search_is_deterministic(case in arb_case()) {
        let config = OptimizerConfig::default();
        let m = model(&case, &config);
        let first = ExhaustiveSolver::new(&m, &config).solve().unwrap();
        let second = ExhaustiveSolver::new(&m, &config).solve().unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn comparator_is_a_strict_weak_order(
        a in arb_cost(),
        b in arb_cost(),
        c in arb_cost(),
        tolerance in 0.0f64..0.2,
    ) {
        let ranking = Ranking {
            priorities: Objective::ALL.to_vec(),
            tolerance,
        };
        let ab = ranking.compare_costs(&a, &b);
        let bc = ranking.compare_costs(&b, &c);
        let ac = ranking.compare_costs(&a, &c);
        prop_assert_eq!(ab, ranking.compare_costs(&b, &a).reverse());
        prop_assert_eq!(ranking.compare_costs(&a, &a), Ordering::Equal);
        if ab != Ordering::Greater && bc != Ordering::Greater {
            prop_assert_ne!(ac, Ordering::Greater);
        }
        if ab == Ordering::Equal && bc == Ordering::Equal {
            prop_assert_eq!(ac, Ordering::Equal);
        }
    }
}
