//! Debug-time verification helpers for candidates.
//!
//! Intended for tests and debug builds; each panics with a message naming
//! the offending module or dependency. They are cheap (linear in the
//! matrices).

use fogplace_model::PlacementModel;

use crate::candidate::{moves, Candidate};

/// Every module is hosted on exactly one node it is allowed on.
pub fn assert_single_placement(model: &PlacementModel, cand: &Candidate) {
    for m in 0..model.num_modules() {
        let host = cand.host(m).unwrap_or_else(|| {
            panic!("module {} is not placed on exactly one node", model.modules[m].name)
        });
        assert!(
            model.is_possible(host, m),
            "module {} placed on forbidden node {}",
            model.modules[m].name,
            model.nodes[host].name
        );
    }
}

/// Tuple rows start at the source host and end at the destination host;
/// migration rows start at the previous host (or the current one on a
/// first run) and end at the current host.
pub fn assert_route_endpoints(model: &PlacementModel, cand: &Candidate) {
    let last = model.num_slots() - 1;
    for (d, dep) in model.dependencies.iter().enumerate() {
        let row = cand.tuple_routing.row(d);
        let (src, dst) = (cand.host(dep.source), cand.host(dep.destination));
        assert_eq!(Some(row[0]), src, "dependency {d} does not start at its source host");
        assert_eq!(Some(row[last]), dst, "dependency {d} does not end at its destination host");
    }
    for m in 0..model.num_modules() {
        let row = cand.migration_routing.row(m);
        let host = cand.host(m);
        let origin = model.previous_node(m).or(host);
        assert_eq!(Some(row[0]), origin, "module {m} migration does not start at its origin");
        assert_eq!(Some(row[last]), host, "module {m} migration does not end at its host");
    }
}

/// Every hop moves along an existing link, and a row never leaves its
/// destination once reached.
pub fn assert_hops_follow_links(model: &PlacementModel, cand: &Candidate) {
    let rows = (0..cand.tuple_routing.rows())
        .map(|r| cand.tuple_routing.row(r))
        .chain((0..cand.migration_routing.rows()).map(|r| cand.migration_routing.row(r)));
    for row in rows {
        for (slot, a, b) in moves(row) {
            assert!(
                model.has_link(a, b),
                "hop {a} -> {b} at slot {slot} has no link"
            );
        }
        let dest = row[row.len() - 1];
        if let Some(first) = row.iter().position(|&n| n == dest) {
            assert!(
                row[first..].iter().all(|&n| n == dest),
                "route {row:?} leaves its destination"
            );
        }
    }
}
