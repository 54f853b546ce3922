//! Candidate encoding: placement plus tuple and migration routing.
//!
//! Routing rows have one slot per node. A row is a path from its origin
//! node to its destination node; once it reaches the destination it repeats
//! it for the remaining slots, so variable-length routes share one shape.

use serde::{Deserialize, Serialize};

use fogplace_core::error::{Error, Result};
use fogplace_core::matrix::Matrix;
use fogplace_model::PlacementModel;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    /// Node × Module, binary.
    pub placement: Matrix<u8>,
    /// Dependency × HopSlot, node indices.
    pub tuple_routing: Matrix<usize>,
    /// Module × HopSlot, node indices.
    pub migration_routing: Matrix<usize>,
}

impl Candidate {
    /// All-zero matrices with the model's dimensions.
    pub fn empty(model: &PlacementModel) -> Self {
        let slots = model.num_slots();
        Self {
            placement: Matrix::filled(model.num_nodes(), model.num_modules(), 0),
            tuple_routing: Matrix::filled(model.dependencies.len(), slots, 0),
            migration_routing: Matrix::filled(model.num_modules(), slots, 0),
        }
    }

    /// The node hosting `module`, if its column holds exactly one 1.
    pub fn host(&self, module: usize) -> Option<usize> {
        let mut found = None;
        for n in 0..self.placement.rows() {
            if self.placement[(n, module)] == 1 {
                if found.is_some() {
                    return None;
                }
                found = Some(n);
            }
        }
        found
    }

    pub fn hosts(&self) -> Vec<Option<usize>> {
        (0..self.placement.cols()).map(|m| self.host(m)).collect()
    }

    /// Modules whose column has a 1 in row `node`.
    pub fn modules_on(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.placement
            .row(node)
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v == 1)
            .map(|(m, _)| m)
    }

    /// Fatal contract check: dimensions, binary placement, node-index range.
    pub fn validate_shape(&self, model: &PlacementModel) -> Result<()> {
        let (n, m, d, s) = (
            model.num_nodes(),
            model.num_modules(),
            model.dependencies.len(),
            model.num_slots(),
        );
        self.placement.ensure_shape(n, m, "placement")?;
        self.tuple_routing.ensure_shape(d, s, "tuple routing")?;
        self.migration_routing.ensure_shape(m, s, "migration routing")?;

        if let Some(v) = self.placement.iter_rows().flatten().find(|&&v| v > 1) {
            return Err(Error::Shape(format!("placement holds non-binary value {v}")));
        }
        for (what, routing) in [
            ("tuple routing", &self.tuple_routing),
            ("migration routing", &self.migration_routing),
        ] {
            if let Some(v) = routing.iter_rows().flatten().find(|&&v| v >= n) {
                return Err(Error::Shape(format!("{what} references node {v} of {n}")));
            }
        }
        Ok(())
    }
}

/// Iterator over the moving steps `(slot, from, to)` of a routing row.
pub fn moves(row: &[usize]) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
    row.windows(2)
        .enumerate()
        .filter(|(_, w)| w[0] != w[1])
        .map(|(j, w)| (j, w[0], w[1]))
}

/// Row starts at `origin`, ends at `dest`, and every move uses a link.
pub fn row_is_valid(model: &PlacementModel, row: &[usize], origin: usize, dest: usize) -> bool {
    row.first() == Some(&origin)
        && row.last() == Some(&dest)
        && moves(row).all(|(_, a, b)| model.has_link(a, b))
}

/// Collapse stationary repeats into the ordered list of visited nodes.
pub fn compress(row: &[usize]) -> Vec<usize> {
    let mut hops: Vec<usize> = row.to_vec();
    hops.dedup();
    hops
}
