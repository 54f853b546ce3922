//! One end-to-end optimization run: extract, search, report.

use serde::Serialize;
use tracing::{info, info_span};

use fogplace_core::application::Application;
use fogplace_core::config::OptimizerConfig;
use fogplace_core::error::Result;
use fogplace_core::hash::hash_serde;
use fogplace_core::manifest::{now_ms, RunManifest};
use fogplace_core::topology::{PreviousPlacement, Topology};
use fogplace_model::{extract, PlacementModel};

use crate::exhaustive::{ExhaustiveSolver, Outcome};
use crate::metrics::SearchStats;
use crate::plan::DeploymentPlan;

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationRun {
    pub model: PlacementModel,
    pub outcome: Outcome,
    /// Present when a feasible placement was found.
    pub plan: Option<DeploymentPlan>,
    pub stats: SearchStats,
    pub manifest: RunManifest,
}

/// Extract the model and run the exhaustive search over it.
pub fn optimize(
    topology: &Topology,
    applications: &[Application],
    previous: Option<&PreviousPlacement>,
    config: &OptimizerConfig,
) -> Result<OptimizationRun> {
    config.validate()?;
    let _span = info_span!("optimize", applications = applications.len()).entered();

    let model = extract(topology, applications, previous, config)?;
    let manifest = RunManifest::new(hash_serde(&model)?, now_ms());

    let report = ExhaustiveSolver::new(&model, config).solve()?;
    let plan = match report.outcome.solution() {
        Some(s) => Some(DeploymentPlan::from_solution(&model, s)?),
        None => None,
    };
    let plan_hash = plan.as_ref().map(hash_serde).transpose()?;
    let manifest = manifest.finish(now_ms(), report.stats.iterations, plan_hash);

    info!(
        run = %manifest.id.0,
        model_hash = %manifest.model_hash.to_hex(),
        feasible = report.outcome.is_feasible(),
        iterations = report.stats.iterations,
        elapsed_ms = manifest.finished_ms.saturating_sub(manifest.started_ms),
        "optimization finished"
    );

    Ok(OptimizationRun {
        model,
        outcome: report.outcome,
        plan,
        stats: report.stats,
        manifest,
    })
}
