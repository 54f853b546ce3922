//! Name-level deployment plan handed to a deployment controller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fogplace_core::error::{Error, Result};
use fogplace_model::PlacementModel;

use crate::candidate::{compress, moves};
use crate::cost::CostVector;
use crate::solution::Solution;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRoute {
    pub source: String,
    pub destination: String,
    /// Node names from the source host to the destination host; a single
    /// entry when both modules share a node.
    pub hops: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    /// node name → hosted module names
    pub placement: BTreeMap<String, Vec<String>>,
    pub routing: Vec<DependencyRoute>,
    /// module name → migration path, only for modules that change node
    pub migration: BTreeMap<String, Vec<String>>,
    pub cost: CostVector,
    pub feasible: bool,
    /// Resource price of running the placement; reported, not optimized.
    pub operational_price: f64,
}

impl DeploymentPlan {
    pub fn from_solution(model: &PlacementModel, solution: &Solution) -> Result<Self> {
        let cand = solution.candidate();
        cand.validate_shape(model)?;

        let mut hosts = Vec::with_capacity(model.num_modules());
        for m in 0..model.num_modules() {
            let host = cand.host(m).ok_or_else(|| {
                Error::Invariant(format!(
                    "module {} is not placed on exactly one node",
                    model.modules[m].name
                ))
            })?;
            hosts.push(host);
        }

        let node_names = |row: &[usize]| -> Vec<String> {
            compress(row)
                .into_iter()
                .map(|n| model.nodes[n].name.clone())
                .collect()
        };

        let mut placement: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (m, &n) in hosts.iter().enumerate() {
            placement
                .entry(model.nodes[n].name.clone())
                .or_default()
                .push(model.modules[m].name.clone());
        }

        let routing = model
            .dependencies
            .iter()
            .enumerate()
            .map(|(d, dep)| DependencyRoute {
                source: model.modules[dep.source].name.clone(),
                destination: model.modules[dep.destination].name.clone(),
                hops: node_names(cand.tuple_routing.row(d)),
            })
            .collect();

        let migration = (0..model.num_modules())
            .filter_map(|m| {
                let path = node_names(cand.migration_routing.row(m));
                (path.len() > 1).then(|| (model.modules[m].name.clone(), path))
            })
            .collect();

        Ok(Self {
            placement,
            routing,
            migration,
            cost: *solution.cost(),
            feasible: solution.is_feasible(),
            operational_price: operational_price(model, &hosts, solution),
        })
    }
}

fn operational_price(model: &PlacementModel, hosts: &[usize], solution: &Solution) -> f64 {
    let hosting: f64 = hosts
        .iter()
        .zip(&model.modules)
        .map(|(&n, module)| {
            let p = &model.nodes[n].price;
            p.mips * module.mips + p.ram * module.ram + p.storage * module.storage
        })
        .sum();

    let routing = &solution.candidate().tuple_routing;
    let transfer: f64 = model
        .dependencies
        .iter()
        .enumerate()
        .flat_map(|(d, dep)| {
            moves(routing.row(d)).map(move |(_, a, _)| model.nodes[a].price.bandwidth * dep.bandwidth)
        })
        .sum();

    hosting + transfer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintChecker;
    use crate::cost::CostEvaluator;
    use crate::exhaustive::ExhaustiveSolver;
    use fogplace_core::config::OptimizerConfig;
    use fogplace_core::prelude::*;
    use fogplace_model::extract;

    fn two_nodes() -> Topology {
        let mut topo = Topology::default();
        let cloud = topo.add_node(
            Node::new(1, "cloud", 1000.0, f64::INFINITY, f64::INFINITY)
                .with_power(1648.0, 1332.0)
                .with_price(ResourcePrice { mips: 0.01, bandwidth: 0.05, ..Default::default() }),
        );
        let edge = topo.add_node(
            Node::new(2, "edge", 100.0, 1000.0, 1000.0)
                .with_power(87.53, 82.44)
                .with_price(ResourcePrice { mips: 0.001, bandwidth: 0.02, ..Default::default() }),
        );
        topo.connect(cloud, edge, 0.01, 100.0);
        topo.sensors.push(Sensor {
            name: "s".into(),
            tuple_type: "RAW".into(),
            gateway: edge,
            emission: Distribution::Deterministic { value: 1.0 },
            latency: 0.0,
        });
        topo
    }

    fn app(cpu: f64) -> Application {
        Application::new(1)
            .with_module(AppModule::new("a", 10.0, 10.0).map("RAW", "OUT", 1.0))
            .with_edge(AppEdge::new(EdgeKind::Sensor, "RAW", "a", "RAW", cpu, 1.0))
    }

    #[test]
    fn plan_names_hosts_and_prices_hosting() {
        let topo = two_nodes();
        let config = OptimizerConfig::default();
        let model = extract(&topo, &[app(50.0)], None, &config).unwrap();
        let report = ExhaustiveSolver::new(&model, &config).solve().unwrap();
        let solution = report.outcome.solution().unwrap();
        let plan = DeploymentPlan::from_solution(&model, solution).unwrap();

        assert!(plan.feasible);
        assert!(plan.migration.is_empty());
        assert_eq!(plan.placement["edge"], vec!["a".to_string(), "s".to_string()]);
        // 50 MIPS at 0.001 on the edge, sensor traffic is local.
        assert!((plan.operational_price - 0.05).abs() < 1e-9);
        for route in &plan.routing {
            assert_eq!(route.hops, vec!["edge".to_string()]);
        }
    }

    #[test]
    fn unplaced_module_is_an_invariant_error() {
        let topo = two_nodes();
        let config = OptimizerConfig::default();
        let model = extract(&topo, &[app(50.0)], None, &config).unwrap();
        let cand = crate::candidate::Candidate::empty(&model);
        let checker = ConstraintChecker::new(&model, &config);
        let evaluator = CostEvaluator::new(&model, &config);
        let solution = Solution::score(cand, &checker, &evaluator).unwrap();
        assert!(matches!(
            DeploymentPlan::from_solution(&model, &solution),
            Err(Error::Invariant(_))
        ));
    }
}
