//! All-pairs minimum hop counts over the finite-latency link graph.
//!
//! This is the routing search's hop-budget oracle: an intermediate hop `z`
//! toward `dest` with `h` slots left is admissible iff
//! `hop_count(z, dest) <= h`. Computed once per model by a breadth-first
//! search from every node.

use std::collections::VecDeque;

use serde::Serialize;

use fogplace_core::matrix::Matrix;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HopIndex {
    /// `None` = unreachable.
    hops: Matrix<Option<usize>>,
}

impl HopIndex {
    /// Build from a square latency matrix; only finite off-diagonal entries
    /// count as links.
    pub fn build(latency: &Matrix<f64>) -> Self {
        let n = latency.rows();
        let mut hops = Matrix::filled(n, n, None);
        let mut queue = VecDeque::with_capacity(n);

        for start in 0..n {
            hops[(start, start)] = Some(0);
            queue.clear();
            queue.push_back(start);
            while let Some(u) = queue.pop_front() {
                let d = hops[(start, u)].unwrap_or(0);
                for v in 0..n {
                    if v != u && latency[(u, v)].is_finite() && hops[(start, v)].is_none() {
                        hops[(start, v)] = Some(d + 1);
                        queue.push_back(v);
                    }
                }
            }
        }

        Self { hops }
    }

    pub fn hop_count(&self, from: usize, to: usize) -> Option<usize> {
        self.hops.get(from, to).copied().flatten()
    }

    /// Can `to` be reached from `from` in at most `budget` hops?
    pub fn within(&self, from: usize, to: usize, budget: usize) -> bool {
        matches!(self.hop_count(from, to), Some(h) if h <= budget)
    }

    pub fn reachable(&self, from: usize, to: usize) -> bool {
        self.hop_count(from, to).is_some()
    }
}
