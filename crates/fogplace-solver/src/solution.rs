//! Scored candidates and their ordering.
//!
//! Ordering is lexicographic: fewer violations first, then each objective
//! in priority order. Objective values are compared by tolerance band:
//! values in the same geometric band `[(1+tol)^k, (1+tol)^(k+1))` tie and
//! fall through to the next priority. Bands partition the reals, so ties
//! are an equivalence relation and the ordering stays transitive; any two
//! tied values are within `tol` of each other.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use fogplace_core::config::{Objective, OptimizerConfig};
use fogplace_core::error::Result;

use crate::candidate::Candidate;
use crate::constraints::{ConstraintChecker, Violations};
use crate::cost::{CostEvaluator, CostVector};

/// A candidate together with its score. Built once by `Solution::score`
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    candidate: Candidate,
    violations: Violations,
    cost: CostVector,
}

impl Solution {
    pub fn score(
        candidate: Candidate,
        checker: &ConstraintChecker<'_>,
        evaluator: &CostEvaluator<'_>,
    ) -> Result<Self> {
        let violations = checker.check(&candidate)?;
        let cost = evaluator.evaluate(&candidate)?;
        Ok(Self {
            candidate,
            violations,
            cost,
        })
    }

    pub(crate) fn from_parts(candidate: Candidate, violations: Violations, cost: CostVector) -> Self {
        Self {
            candidate,
            violations,
            cost,
        }
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub fn violations(&self) -> &Violations {
        &self.violations
    }

    pub fn total_violations(&self) -> u32 {
        self.violations.total()
    }

    pub fn cost(&self) -> &CostVector {
        &self.cost
    }

    pub fn is_feasible(&self) -> bool {
        self.violations.is_feasible()
    }

    /// `Less` means `self` is the better solution.
    pub fn compare(&self, other: &Self, ranking: &Ranking) -> Ordering {
        self.total_violations()
            .cmp(&other.total_violations())
            .then_with(|| ranking.compare_costs(&self.cost, &other.cost))
    }
}

/// Priority order and tolerance used to compare cost vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub priorities: Vec<Objective>,
    pub tolerance: f64,
}

impl Ranking {
    pub fn new(config: &OptimizerConfig) -> Self {
        Self {
            priorities: config.priorities.clone(),
            tolerance: config.tolerance,
        }
    }

    pub fn compare_costs(&self, a: &CostVector, b: &CostVector) -> Ordering {
        for &o in &self.priorities {
            let ord = self.compare_values(a.get(o), b.get(o));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Lower is better; values in the same band are `Equal`.
    pub fn compare_values(&self, a: f64, b: f64) -> Ordering {
        // Below machine epsilon every band is narrower than one ulp.
        if self.tolerance < f64::EPSILON {
            return a.total_cmp(&b);
        }
        let (ca, ka) = self.band(a);
        let (cb, kb) = self.band(b);
        ca.cmp(&cb).then_with(|| ka.total_cmp(&kb))
    }

    /// Band key: (class, index). The index stays an `f64` so large
    /// `ln|v| / ln(1+tol)` ratios keep their order.
    fn band(&self, v: f64) -> (i8, f64) {
        if v.is_nan() {
            return (3, 0.0);
        }
        if v.is_infinite() {
            return if v > 0.0 { (2, 0.0) } else { (-2, 0.0) };
        }
        if v == 0.0 {
            return (0, 0.0);
        }
        let k = (v.abs().ln() / self.tolerance.ln_1p()).floor();
        if v > 0.0 {
            (1, k)
        } else {
            (-1, -k)
        }
    }
}
