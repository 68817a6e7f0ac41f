//! Shared application state.

use std::sync::Arc;

use retrigger_core::{BatchSummary, RunId, TaskSpec};
use retrigger_engine::DecisionEngine;
use tracing::info;

/// Shared application state: the execution core plus the validated,
/// read-only task list.
pub struct AppState {
    /// Decision engine over the configured actuator, store, and reporter.
    pub engine: Arc<DecisionEngine>,

    /// Validated task specifications, supplied at startup.
    pub specs: Vec<TaskSpec>,

    /// Maximum tasks in flight per batch.
    pub concurrency: usize,
}

impl AppState {
    /// Create a new AppState wrapped in Arc.
    pub fn new(engine: Arc<DecisionEngine>, specs: Vec<TaskSpec>, concurrency: usize) -> Arc<Self> {
        Arc::new(Self {
            engine,
            specs,
            concurrency,
        })
    }

    /// Run the full batch once and return its summary. Per-task failures
    /// are contained inside the engine; this never fails.
    pub async fn run_once(&self) -> BatchSummary {
        let run_id = RunId::generate();
        info!(run_id = %run_id, tasks = self.specs.len(), "Starting batch run");
        let outcomes = self
            .engine
            .run_batch(&run_id, &self.specs, self.concurrency)
            .await;
        BatchSummary::from_outcomes(&outcomes)
    }
}
