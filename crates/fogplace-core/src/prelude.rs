//! Convenient re-exports for downstream crates.

pub use crate::application::{AppEdge, AppLoop, AppModule, Application, EdgeKind, TupleMapping};
pub use crate::config::{Objective, ObjectiveWeights, OptimizerConfig};
pub use crate::error::{Error, Result};
pub use crate::id::{AppId, NodeId};
pub use crate::manifest::{ManifestId, RunManifest};
pub use crate::matrix::Matrix;
pub use crate::topology::{
    Actuator, Distribution, Link, Node, PreviousPlacement, ResourcePrice, Sensor, Topology,
};
