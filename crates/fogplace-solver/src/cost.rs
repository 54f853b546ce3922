//! Multi-objective cost evaluation.
//!
//! Five independent components, each multiplied by its configured weight:
//!
//! | objective  | value |
//! |------------|-------|
//! | QoS        | loops whose worst-case latency exceeds the deadline |
//! | Power      | dynamic power share of hosted modules and forwarded traffic |
//! | Processing | Σ module MIPS / (node MIPS × ceiling) |
//! | Bandwidth  | Σ per hop dependency bandwidth / (link bandwidth × ceiling) |
//! | Migration  | Σ per hop transfer time × modules depending on the mover |
//!
//! Power and migration mix units, so they are computed on values scaled by
//! the model's maxima. Loop latency is compared in physical units.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use fogplace_core::config::{Objective, OptimizerConfig};
use fogplace_core::error::Result;
use fogplace_model::{PlacementModel, Scales};

use crate::candidate::{moves, Candidate};

/// Weighted objective values, indexed by `Objective::index`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostVector(pub [f64; Objective::COUNT]);

impl CostVector {
    pub fn get(&self, objective: Objective) -> f64 {
        self.0[objective.index()]
    }

    fn set(&mut self, objective: Objective, value: f64) {
        self.0[objective.index()] = value;
    }
}

impl fmt::Display for CostVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "qos={:.4} power={:.4} processing={:.4} bandwidth={:.4} migration={:.4}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4]
        )
    }
}

/// `value / capacity`, zero for unbounded capacity.
fn share(value: f64, capacity: f64) -> f64 {
    if capacity.is_infinite() {
        0.0
    } else if capacity > 0.0 {
        value / capacity
    } else {
        f64::INFINITY
    }
}

pub struct CostEvaluator<'a> {
    model: &'a PlacementModel,
    config: &'a OptimizerConfig,
}

impl<'a> CostEvaluator<'a> {
    pub fn new(model: &'a PlacementModel, config: &'a OptimizerConfig) -> Self {
        Self { model, config }
    }

    pub fn evaluate(&self, cand: &Candidate) -> Result<CostVector> {
        cand.validate_shape(self.model)?;
        let hosts = cand.hosts();
        let w = &self.config.weights;

        let mut cost = CostVector::default();
        let raw = [
            (Objective::Qos, self.qos(cand)),
            (Objective::Power, self.power(cand, &hosts)),
            (Objective::Processing, self.processing(&hosts)),
            (Objective::Bandwidth, self.bandwidth(cand)),
            (Objective::Migration, self.migration(cand)),
        ];
        for (objective, value) in raw {
            cost.set(objective, value * w.get(objective));
        }
        Ok(cost)
    }

    /// Worst-case latency of every loop, in loop order.
    pub fn loop_latencies(&self, cand: &Candidate) -> Vec<f64> {
        let hosts = cand.hosts();
        let node_load = self.node_load(&hosts);
        let step_load = self.step_load(cand);
        let ceiling = self.config.mips_ceiling;

        self.model
            .loops
            .iter()
            .map(|lp| {
                let mut latency = lp.fixed_latency;
                for (k, &d) in lp.deps.iter().enumerate() {
                    let next = lp.modules[k + 1];
                    if self.model.modules[next].mips > 0.0 {
                        if let Some(n) = hosts[next] {
                            latency += share(node_load[n], self.model.nodes[n].mips * ceiling);
                        }
                    }
                    latency += self.transmission_latency(cand, d, &step_load);
                }
                latency
            })
            .collect()
    }

    fn qos(&self, cand: &Candidate) -> f64 {
        self.loop_latencies(cand)
            .iter()
            .zip(&self.model.loops)
            .filter(|(lat, lp)| **lat > lp.deadline)
            .count() as f64
    }

    /// Link latency plus queueing behind every flow sharing the same
    /// directed link at the same routing step.
    fn transmission_latency(
        &self,
        cand: &Candidate,
        dep: usize,
        step_load: &HashMap<(usize, usize, usize), f64>,
    ) -> f64 {
        moves(cand.tuple_routing.row(dep))
            .map(|(j, a, b)| {
                let shared = step_load.get(&(j, a, b)).copied().unwrap_or(0.0);
                self.model.latency[(a, b)]
                    + share(shared, self.model.bandwidth[(a, b)] * self.config.bandwidth_ceiling)
            })
            .sum()
    }

    fn step_load(&self, cand: &Candidate) -> HashMap<(usize, usize, usize), f64> {
        let mut load = HashMap::new();
        for (d, dep) in self.model.dependencies.iter().enumerate() {
            for key in moves(cand.tuple_routing.row(d)) {
                *load.entry(key).or_insert(0.0) += dep.bandwidth;
            }
        }
        load
    }

    fn node_load(&self, hosts: &[Option<usize>]) -> Vec<f64> {
        let mut load = vec![0.0; self.model.num_nodes()];
        for (m, host) in hosts.iter().enumerate() {
            if let Some(n) = host {
                load[*n] += self.model.modules[m].mips;
            }
        }
        load
    }

    fn power(&self, cand: &Candidate, hosts: &[Option<usize>]) -> f64 {
        let scale = self.model.scales.power_delta;
        let delta = |n: usize| Scales::normalize(self.model.nodes[n].power_delta(), scale);

        let compute: f64 = hosts
            .iter()
            .enumerate()
            .filter_map(|(m, h)| h.map(|n| (m, n)))
            .map(|(m, n)| delta(n) * share(self.model.modules[m].mips, self.model.nodes[n].mips))
            .sum();

        let mut transmit = 0.0;
        for (d, dep) in self.model.dependencies.iter().enumerate() {
            for (_, a, b) in moves(cand.tuple_routing.row(d)) {
                transmit += delta(a) * share(dep.bandwidth, self.model.bandwidth[(a, b)]);
            }
        }

        compute + transmit
    }

    fn processing(&self, hosts: &[Option<usize>]) -> f64 {
        hosts
            .iter()
            .enumerate()
            .filter_map(|(m, h)| h.map(|n| (m, n)))
            .map(|(m, n)| {
                share(
                    self.model.modules[m].mips,
                    self.model.nodes[n].mips * self.config.mips_ceiling,
                )
            })
            .sum()
    }

    fn bandwidth(&self, cand: &Candidate) -> f64 {
        let ceiling = self.config.bandwidth_ceiling;
        self.model
            .dependencies
            .iter()
            .enumerate()
            .map(|(d, dep)| {
                moves(cand.tuple_routing.row(d))
                    .map(|(_, a, b)| share(dep.bandwidth, self.model.bandwidth[(a, b)] * ceiling))
                    .sum::<f64>()
            })
            .sum()
    }

    fn migration(&self, cand: &Candidate) -> f64 {
        let scales = &self.model.scales;
        let share_of_link = self.config.migration_bandwidth_share;
        (0..self.model.num_modules())
            .map(|m| {
                let dependents = self.model.dependents(m) as f64;
                if dependents == 0.0 {
                    return 0.0;
                }
                let size = Scales::normalize(self.model.modules[m].size(), scales.module_size);
                let time: f64 = moves(cand.migration_routing.row(m))
                    .map(|(_, a, b)| {
                        let bw = Scales::normalize(self.model.bandwidth[(a, b)], scales.bandwidth);
                        share(size, bw * share_of_link)
                    })
                    .sum();
                time * dependents
            })
            .sum()
    }
}
