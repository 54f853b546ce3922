#![forbid(unsafe_code)]
//! fogplace-model: from topology + application graphs → the flat numeric
//! model every candidate is scored against.
//!
//! Design:
//! - `extract` resolves names to dense node/module indices and builds the
//!   latency/bandwidth/feasibility matrices.
//! - `demand` walks each application's tuple-emission graph to obtain
//!   worst-case per-module and per-dependency demand.
//! - `reach` precomputes all-pairs minimum hop counts used to prune routing.
//!
//! The resulting `PlacementModel` is immutable and shared read-only by all
//! candidate evaluations of one optimization run.

pub mod demand;
pub mod extract;
pub mod model;
pub mod reach;

pub use extract::extract;
pub use model::{Dependency, LoopSpec, ModuleInfo, ModuleKind, NodeInfo, PlacementModel, Scales};
pub use reach::HopIndex;
