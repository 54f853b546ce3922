//! Run manifest for audit of optimization runs.
//!
//! The solver emits one manifest per run; identical model + config yields
//! identical `model_hash` and (for the exhaustive solver) `plan_hash`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: ManifestId,

    /// Stable hash of the extracted numeric model.
    pub model_hash: Hash256,

    /// Stable hash of the chosen deployment plan, if any was found.
    pub plan_hash: Option<Hash256>,

    /// Optimizer version string for provenance.
    pub engine_version: String,

    /// Leaves evaluated by the search.
    pub iterations: u64,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunManifest {
    pub fn new(model_hash: Hash256, started_ms: u64) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            model_hash,
            plan_hash: None,
            engine_version: crate::VERSION.to_string(),
            iterations: 0,
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(mut self, finished_ms: u64, iterations: u64, plan_hash: Option<Hash256>) -> Self {
        self.finished_ms = finished_ms;
        self.iterations = iterations;
        self.plan_hash = plan_hash;
        self
    }
}

/// Milliseconds since the Unix epoch, saturating to 0 on clock skew.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
