//! Random candidate generator.
//!
//! Uniform choices only: a feasible node per module, then a random walk per
//! routing row restricted to hops that can still reach the row's
//! destination in the slots left. This is the only source of randomness in
//! the crate.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use fogplace_core::config::OptimizerConfig;
use fogplace_model::PlacementModel;

use crate::candidate::Candidate;

pub struct CandidateGenerator {
    rng: StdRng,
}

impl CandidateGenerator {
    /// Seeded from `config.seed`, or from OS entropy when unset.
    pub fn new(config: &OptimizerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// One structurally valid candidate, or `None` when the drawn placement
    /// leaves some dependency (or migration) without any route.
    pub fn generate(&mut self, model: &PlacementModel) -> Option<Candidate> {
        let mut cand = Candidate::empty(model);

        let mut hosts = Vec::with_capacity(model.num_modules());
        for m in 0..model.num_modules() {
            let options: Vec<usize> = model.candidate_nodes(m).collect();
            let node = *options.choose(&mut self.rng)?;
            cand.placement[(node, m)] = 1;
            hosts.push(node);
        }

        for (d, dep) in model.dependencies.iter().enumerate() {
            let row = random_route(model, hosts[dep.source], hosts[dep.destination], &mut self.rng)?;
            cand.tuple_routing.row_mut(d).copy_from_slice(&row);
        }

        for (m, &host) in hosts.iter().enumerate() {
            let origin = model.previous_node(m).unwrap_or(host);
            let row = random_route(model, origin, host, &mut self.rng)?;
            cand.migration_routing.row_mut(m).copy_from_slice(&row);
        }

        Some(cand)
    }
}

/// Random fixed-length path `origin → dest`, snapping to `dest` once reached.
pub fn random_route<R: Rng + ?Sized>(
    model: &PlacementModel,
    origin: usize,
    dest: usize,
    rng: &mut R,
) -> Option<Vec<usize>> {
    let slots = model.num_slots();
    let mut row = vec![origin; slots];
    for slot in 1..slots {
        let prev = row[slot - 1];
        if prev == dest {
            row[slot] = dest;
            continue;
        }
        let options: Vec<usize> = (0..model.num_nodes())
            .filter(|&z| model.is_valid_hop(prev, z, dest, slot))
            .collect();
        row[slot] = *options.choose(rng)?;
    }
    (row.last() == Some(&dest)).then_some(row)
}
