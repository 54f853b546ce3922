//! Search progress bookkeeping.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cost::CostVector;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Fully instantiated leaves evaluated.
    pub iterations: u64,
    /// Feasible leaves among them.
    pub feasible: u64,
    /// (iteration → best cost) at every improvement.
    pub history: Vec<(u64, CostVector)>,
    /// Stopped by `max_iterations` before the tree was exhausted.
    pub truncated: bool,
}

impl SearchStats {
    pub(crate) fn record_best(&mut self, cost: CostVector) {
        debug!(iteration = self.iterations, %cost, "new best solution");
        self.history.push((self.iterations, cost));
    }

    pub fn best_cost(&self) -> Option<&CostVector> {
        self.history.last().map(|(_, c)| c)
    }
}
