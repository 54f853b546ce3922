//! Constraint checker.
//!
//! Each family is counted independently, one unit per offending instance;
//! a total of zero means the candidate is feasible. Shape problems are not
//! counted: they are returned as `Error::Shape` and abort the run.

use serde::{Deserialize, Serialize};

use fogplace_core::config::OptimizerConfig;
use fogplace_core::error::Result;
use fogplace_core::matrix::Matrix;
use fogplace_model::PlacementModel;

use crate::candidate::{moves, row_is_valid, Candidate};

/// Relative slack absorbing float rounding in capacity comparisons.
const SLACK: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violations {
    /// (node, resource) pairs over their utilization ceiling.
    pub resources: u32,
    /// Modules placed where `possible_deployment` forbids.
    pub feasibility: u32,
    /// Module columns not summing to exactly one.
    pub single_placement: u32,
    /// Dependency rows with wrong endpoints or non-link moves.
    pub routing: u32,
    /// Directed links over their bandwidth ceiling.
    pub bandwidth: u32,
    /// Migration rows with wrong endpoints or non-link moves.
    pub migration_routing: u32,
    /// Migrations slower than the module's deadline.
    pub migration_deadline: u32,
}

impl Violations {
    pub fn total(&self) -> u32 {
        self.resources
            + self.feasibility
            + self.single_placement
            + self.routing
            + self.bandwidth
            + self.migration_routing
            + self.migration_deadline
    }

    pub fn is_feasible(&self) -> bool {
        self.total() == 0
    }
}

fn fits(load: f64, capacity: f64, ceiling: f64) -> bool {
    let limit = capacity * ceiling;
    load <= limit + limit.abs() * SLACK
}

pub struct ConstraintChecker<'a> {
    model: &'a PlacementModel,
    config: &'a OptimizerConfig,
}

impl<'a> ConstraintChecker<'a> {
    pub fn new(model: &'a PlacementModel, config: &'a OptimizerConfig) -> Self {
        Self { model, config }
    }

    pub fn check(&self, cand: &Candidate) -> Result<Violations> {
        cand.validate_shape(self.model)?;
        let hosts = cand.hosts();

        let mut v = Violations {
            resources: self.resources(cand),
            ..Violations::default()
        };

        for m in 0..self.model.num_modules() {
            let placed: Vec<usize> = (0..self.model.num_nodes())
                .filter(|&n| cand.placement[(n, m)] == 1)
                .collect();
            if placed.len() != 1 {
                v.single_placement += 1;
            }
            v.feasibility += placed
                .iter()
                .filter(|&&n| !self.model.is_possible(n, m))
                .count() as u32;
        }

        for (d, dep) in self.model.dependencies.iter().enumerate() {
            let ok = match (hosts[dep.source], hosts[dep.destination]) {
                (Some(s), Some(t)) => row_is_valid(self.model, cand.tuple_routing.row(d), s, t),
                _ => false,
            };
            if !ok {
                v.routing += 1;
            }
        }

        v.bandwidth = self.bandwidth(cand);

        for (m, host) in hosts.iter().enumerate() {
            let Some(dest) = *host else {
                v.migration_routing += 1;
                continue;
            };
            let origin = self.model.previous_node(m).unwrap_or(dest);
            let row = cand.migration_routing.row(m);
            if !row_is_valid(self.model, row, origin, dest) {
                v.migration_routing += 1;
            } else if migration_time(self.model, self.config, m, row)
                > self.model.modules[m].migration_deadline
            {
                v.migration_deadline += 1;
            }
        }

        Ok(v)
    }

    fn resources(&self, cand: &Candidate) -> u32 {
        let c = self.config;
        let mut count = 0;
        for (n, node) in self.model.nodes.iter().enumerate() {
            let (mut mips, mut ram, mut storage) = (0.0, 0.0, 0.0);
            for m in cand.modules_on(n) {
                let module = &self.model.modules[m];
                mips += module.mips;
                ram += module.ram;
                storage += module.storage;
            }
            count += [
                fits(mips, node.mips, c.mips_ceiling),
                fits(ram, node.ram, c.ram_ceiling),
                fits(storage, node.storage, c.storage_ceiling),
            ]
            .iter()
            .filter(|ok| !**ok)
            .count() as u32;
        }
        count
    }

    fn bandwidth(&self, cand: &Candidate) -> u32 {
        let load = link_load(self.model, cand);
        let mut count = 0;
        for i in 0..self.model.num_nodes() {
            for j in 0..self.model.num_nodes() {
                let l = load[(i, j)];
                if l > 0.0 && !fits(l, self.model.bandwidth[(i, j)], self.config.bandwidth_ceiling) {
                    count += 1;
                }
            }
        }
        count
    }
}

/// Aggregate dependency bandwidth per directed link, over every move of
/// every tuple routing row that uses a real link.
pub fn link_load(model: &PlacementModel, cand: &Candidate) -> Matrix<f64> {
    let n = model.num_nodes();
    let mut load = Matrix::filled(n, n, 0.0);
    for (d, dep) in model.dependencies.iter().enumerate() {
        for (_, a, b) in moves(cand.tuple_routing.row(d)) {
            if model.has_link(a, b) {
                load[(a, b)] += dep.bandwidth;
            }
        }
    }
    load
}

/// Worst-case time to move `module` along `row`: per hop the link latency
/// plus transfer time over the migration share of the link, plus the VM
/// setup constant when the module moves at all.
pub fn migration_time(model: &PlacementModel, config: &OptimizerConfig, module: usize, row: &[usize]) -> f64 {
    let size = model.modules[module].size();
    let mut total = 0.0;
    let mut moved = false;
    for (_, a, b) in moves(row) {
        moved = true;
        let available = model.bandwidth[(a, b)] * config.migration_bandwidth_share;
        total += model.latency[(a, b)] + if available > 0.0 { size / available } else { f64::INFINITY };
    }
    if moved {
        total + config.vm_setup_time
    } else {
        0.0
    }
}
