#![forbid(unsafe_code)]
//! fogplace-core: shared vocabulary for the placement optimizer.
//!
//! - Input descriptions of the physical topology (`topology`) and of the
//!   application graphs deployed on it (`application`).
//! - A dense row-major `Matrix` used for placement and routing encodings.
//! - Optimizer configuration, errors, stable hashing and run manifests.
//!
//! No search, scoring, or extraction logic lives here.

pub mod application;
pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod manifest;
pub mod matrix;
pub mod prelude;
pub mod topology;

/// Version string recorded in run manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
