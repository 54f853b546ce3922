//! fogplace: placement, routing, and migration planning for fog
//! application modules.
//!
//! Umbrella over the workspace crates; see `fogplace_solver::optimize` for
//! the end-to-end entry point.

pub use fogplace_core;
pub use fogplace_model;
pub use fogplace_solver;

pub use fogplace_solver::{optimize, DeploymentPlan, OptimizationRun, Outcome};
