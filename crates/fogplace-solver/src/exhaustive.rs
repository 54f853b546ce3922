//! Exhaustive depth-first solver.
//!
//! Three nested phases, explored in a fixed order with backtracking:
//! placement (every feasible node per module), tuple routing (every
//! admissible hop per slot of every dependency row), and migration routing
//! (same shape, rooted at the previous placement). Each complete leaf is
//! scored; the best feasible one wins. Deterministic: no randomness here.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use fogplace_core::config::OptimizerConfig;
use fogplace_core::error::Result;
use fogplace_core::matrix::Matrix;
use fogplace_model::PlacementModel;

use crate::candidate::Candidate;
use crate::constraints::ConstraintChecker;
use crate::cost::CostEvaluator;
use crate::metrics::SearchStats;
use crate::solution::{Ranking, Solution};

/// Progress is logged every this many leaves.
const PROGRESS_EVERY: u64 = 1 << 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Placed(Box<Solution>),
    /// The search space holds no feasible leaf.
    NoFeasiblePlacement,
}

impl Outcome {
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            Outcome::Placed(s) => Some(s),
            Outcome::NoFeasiblePlacement => None,
        }
    }

    pub fn is_feasible(&self) -> bool {
        matches!(self, Outcome::Placed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub outcome: Outcome,
    pub stats: SearchStats,
}

pub struct ExhaustiveSolver<'a> {
    model: &'a PlacementModel,
    config: &'a OptimizerConfig,
}

impl<'a> ExhaustiveSolver<'a> {
    pub fn new(model: &'a PlacementModel, config: &'a OptimizerConfig) -> Self {
        Self { model, config }
    }

    pub fn solve(&self) -> Result<SearchReport> {
        let mut search = Search {
            model: self.model,
            checker: ConstraintChecker::new(self.model, self.config),
            evaluator: CostEvaluator::new(self.model, self.config),
            ranking: Ranking::new(self.config),
            limit: self.config.max_iterations,
            cand: Candidate::empty(self.model),
            hosts: vec![0; self.model.num_modules()],
            previous: (0..self.model.num_modules())
                .map(|m| self.model.previous_node(m))
                .collect(),
            best: None,
            stats: SearchStats::default(),
            stopped: false,
        };

        search.place(0)?;

        let Search { best, stats, .. } = search;
        info!(
            iterations = stats.iterations,
            feasible = stats.feasible,
            truncated = stats.truncated,
            found = best.is_some(),
            "exhaustive search finished"
        );
        let outcome = match best {
            Some(s) => Outcome::Placed(Box::new(s)),
            None => Outcome::NoFeasiblePlacement,
        };
        Ok(SearchReport { outcome, stats })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Tuple,
    Migration,
}

struct Search<'a> {
    model: &'a PlacementModel,
    checker: ConstraintChecker<'a>,
    evaluator: CostEvaluator<'a>,
    ranking: Ranking,
    limit: Option<u64>,
    cand: Candidate,
    /// Host of each module under the current placement prefix.
    hosts: Vec<usize>,
    previous: Vec<Option<usize>>,
    best: Option<Solution>,
    stats: SearchStats,
    stopped: bool,
}

impl Search<'_> {
    fn place(&mut self, module: usize) -> Result<()> {
        if module == self.model.num_modules() {
            return self.route(Phase::Tuple, 0, 0);
        }
        let nodes: Vec<usize> = self.model.candidate_nodes(module).collect();
        for n in nodes {
            self.cand.placement[(n, module)] = 1;
            self.hosts[module] = n;
            self.place(module + 1)?;
            self.cand.placement[(n, module)] = 0;
            if self.stopped {
                break;
            }
        }
        Ok(())
    }

    fn rows(&self, phase: Phase) -> usize {
        match phase {
            Phase::Tuple => self.model.dependencies.len(),
            Phase::Migration => self.model.num_modules(),
        }
    }

    fn endpoints(&self, phase: Phase, row: usize) -> (usize, usize) {
        match phase {
            Phase::Tuple => {
                let dep = &self.model.dependencies[row];
                (self.hosts[dep.source], self.hosts[dep.destination])
            }
            Phase::Migration => {
                let host = self.hosts[row];
                (self.previous[row].unwrap_or(host), host)
            }
        }
    }

    fn routing(&mut self, phase: Phase) -> &mut Matrix<usize> {
        match phase {
            Phase::Tuple => &mut self.cand.tuple_routing,
            Phase::Migration => &mut self.cand.migration_routing,
        }
    }

    fn route(&mut self, phase: Phase, row: usize, slot: usize) -> Result<()> {
        if row == self.rows(phase) {
            return match phase {
                Phase::Tuple => self.route(Phase::Migration, 0, 0),
                Phase::Migration => self.leaf(),
            };
        }
        let slots = self.model.num_slots();
        if slot == slots {
            return self.route(phase, row + 1, 0);
        }

        let (origin, dest) = self.endpoints(phase, row);
        if slot == 0 {
            if slots == 1 && origin != dest {
                return Ok(());
            }
            self.routing(phase)[(row, 0)] = origin;
            return self.route(phase, row, 1);
        }

        let prev = self.routing(phase)[(row, slot - 1)];
        if prev == dest {
            self.routing(phase)[(row, slot)] = dest;
            return self.route(phase, row, slot + 1);
        }

        for z in 0..self.model.num_nodes() {
            if !self.model.is_valid_hop(prev, z, dest, slot) {
                continue;
            }
            self.routing(phase)[(row, slot)] = z;
            self.route(phase, row, slot + 1)?;
            if self.stopped {
                break;
            }
        }
        Ok(())
    }

    fn leaf(&mut self) -> Result<()> {
        self.stats.iterations += 1;
        let iteration = self.stats.iterations;

        let violations = self.checker.check(&self.cand)?;
        trace!(iteration, violations = violations.total(), "leaf");

        if violations.is_feasible() {
            self.stats.feasible += 1;
            let cost = self.evaluator.evaluate(&self.cand)?;
            let better = match &self.best {
                None => true,
                Some(b) => self.ranking.compare_costs(&cost, b.cost()) == Ordering::Less,
            };
            if better {
                self.best = Some(Solution::from_parts(self.cand.clone(), violations, cost));
                self.stats.record_best(cost);
            }
        }

        if iteration % PROGRESS_EVERY == 0 {
            debug!(iteration, feasible = self.stats.feasible, "search progress");
        }
        if matches!(self.limit, Some(limit) if iteration >= limit) {
            self.stopped = true;
            self.stats.truncated = true;
        }
        Ok(())
    }
}
