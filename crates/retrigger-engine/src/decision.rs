//! Per-task decision state machine.
//!
//! Conditional tasks walk probe, code match, cooldown gate, dispatch;
//! Scheduled tasks dispatch directly. Every failure inside the machine is
//! caught here, classified, and returned as a `Failed` outcome - nothing
//! propagates to the executor.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use retrigger_core::{
    dedup_key, BatchSummary, ErrorKind, RunId, TaskMode, TaskOutcome, TaskSpec,
};
use tracing::{debug, error};

use crate::actuator::Actuator;
use crate::executor::{self, TaskHandler};
use crate::report::Reporter;
use crate::store::CooldownStore;

/// Decides, per task, whether to skip or dispatch, and maintains the
/// cooldown state around the dispatch. Cheap to clone; all fields are
/// shared handles.
#[derive(Clone)]
pub struct DecisionEngine {
    actuator: Arc<dyn Actuator>,
    store: Arc<dyn CooldownStore>,
    reporter: Reporter,
}

impl DecisionEngine {
    /// Create an engine over the given actuator, store, and reporter.
    pub fn new(
        actuator: Arc<dyn Actuator>,
        store: Arc<dyn CooldownStore>,
        reporter: Reporter,
    ) -> Self {
        Self {
            actuator,
            store,
            reporter,
        }
    }

    /// Run the whole batch with at most `limit` tasks in flight, emitting
    /// the summary event, and return the outcomes in input order.
    pub async fn run_batch(
        &self,
        run_id: &RunId,
        specs: &[TaskSpec],
        limit: usize,
    ) -> Vec<TaskOutcome> {
        let handler: Arc<dyn TaskHandler> = Arc::new(self.clone());
        let outcomes = executor::run_batch(handler, specs, limit).await;
        let summary = BatchSummary::from_outcomes(&outcomes);
        self.reporter.batch_summary(run_id, &summary);
        outcomes
    }

    /// Process one task to a terminal outcome.
    pub async fn decide(&self, spec: &TaskSpec) -> TaskOutcome {
        self.reporter.task_started(spec);
        let outcome = match spec.mode {
            TaskMode::Conditional => self.decide_conditional(spec).await,
            TaskMode::Scheduled => self.decide_scheduled(spec).await,
        };
        self.reporter.outcome(spec, &outcome);
        outcome
    }

    /// Scheduled mode: dispatch unconditionally. No probe, and no cooldown
    /// gate even when a window is configured - the gate is only reachable
    /// from conditional mode.
    async fn decide_scheduled(&self, spec: &TaskSpec) -> TaskOutcome {
        match self.actuator.dispatch(&spec.dispatch).await {
            Ok(()) => TaskOutcome::scheduled(&spec.name),
            Err(e) => TaskOutcome::failed(&spec.name, e.kind(), e.to_string()),
        }
    }

    async fn decide_conditional(&self, spec: &TaskSpec) -> TaskOutcome {
        // Validation guarantees the URL; a missing one here is a contained
        // failure, not a panic.
        let Some(url) = spec.check_url.as_deref() else {
            return TaskOutcome::failed(
                &spec.name,
                ErrorKind::UnknownError,
                "conditional task without check_url",
            );
        };

        let code = match self.actuator.probe(url).await {
            Ok(code) => code,
            Err(e) => return TaskOutcome::failed(&spec.name, e.kind(), e.to_string()),
        };
        debug!(task = %spec.name, status = code, "Probe answered");

        if !spec.trigger_status_codes.contains(&code) {
            return TaskOutcome::status_not_trigger(&spec.name);
        }

        let key = dedup_key(url, code);
        if !spec.cooldown.is_zero() {
            // A store outage fails the task rather than silently lifting
            // the throttle.
            match self.store.get(&key).await {
                Err(e) => {
                    return TaskOutcome::failed(&spec.name, ErrorKind::UnknownError, e.to_string())
                }
                Ok(Some(last)) => {
                    let elapsed = Utc::now()
                        .signed_duration_since(last)
                        .to_std()
                        .unwrap_or_default();
                    if elapsed < spec.cooldown {
                        return TaskOutcome::cooldown_active(&spec.name, spec.cooldown - elapsed);
                    }
                }
                Ok(None) => {}
            }
        }

        if let Err(e) = self.actuator.dispatch(&spec.dispatch).await {
            // A failed dispatch must not poison the cooldown window.
            return TaskOutcome::failed(&spec.name, e.kind(), e.to_string());
        }

        if !spec.cooldown.is_zero() {
            // Write-after-dispatch. The dispatch already happened, so a put
            // failure leaves the outcome triggered; the next run may simply
            // re-trigger early.
            if let Err(e) = self.store.put(&key, Utc::now()).await {
                error!(task = %spec.name, key = %key, error = %e, "Cooldown record write failed");
            }
        }

        TaskOutcome::condition_met(&spec.name)
    }
}

#[async_trait]
impl TaskHandler for DecisionEngine {
    async fn handle(&self, spec: &TaskSpec) -> TaskOutcome {
        self.decide(spec).await
    }
}
