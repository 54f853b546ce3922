#![forbid(unsafe_code)]
//! fogplace-solver: score and search placement × routing × migration
//! candidates against a `PlacementModel`.
//!
//! Responsibilities:
//! - `candidate`: the three-matrix encoding and its shape contract.
//! - `generator`: one random, structurally valid candidate.
//! - `constraints` / `cost`: violation count and weighted cost vector.
//! - `solution`: scored candidates and the tolerance-banded comparator.
//! - `exhaustive`: depth-first enumeration of the full search space.
//! - `plan`: name-level output consumed by a deployment controller.
//! - `run`: `optimize`, the end-to-end entry point with its run manifest.
//!
//! Single-threaded and synchronous; the model is shared read-only and every
//! candidate owns its matrices.

pub mod candidate;
pub mod constraints;
pub mod cost;
pub mod exhaustive;
pub mod generator;
pub mod metrics;
pub mod plan;
pub mod run;
pub mod solution;
pub mod verify;

#[cfg(test)]
mod testkit;

pub use candidate::Candidate;
pub use constraints::{ConstraintChecker, Violations};
pub use cost::{CostEvaluator, CostVector};
pub use exhaustive::{ExhaustiveSolver, Outcome, SearchReport};
pub use generator::CandidateGenerator;
pub use metrics::SearchStats;
pub use plan::{DependencyRoute, DeploymentPlan};
pub use run::{optimize, OptimizationRun};
pub use solution::{Ranking, Solution};
