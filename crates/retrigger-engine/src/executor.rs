//! Bounded-concurrency batch execution.
//!
//! Fans an ordered list of task specs out through a [`TaskHandler`] with at
//! most `limit` executions in flight. Outcomes come back positionally in
//! input order regardless of completion order, and a panicking task is
//! contained into a `Failed` outcome rather than sinking the batch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use retrigger_core::{ErrorKind, TaskOutcome, TaskSpec};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

/// The per-task processing seam the executor fans out through.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Process one task to a terminal outcome. Must not raise; internal
    /// failures are converted into a `Failed` outcome by the handler.
    async fn handle(&self, spec: &TaskSpec) -> TaskOutcome;
}

/// Run every spec through `handler`, at most `limit` in flight at once.
///
/// `limit` is clamped to at least 1. `limit >= specs.len()` is fully
/// parallel, `limit == 1` fully sequential, empty input returns an empty
/// list immediately. The call completes only after every in-flight
/// execution has finished.
pub async fn run_batch(
    handler: Arc<dyn TaskHandler>,
    specs: &[TaskSpec],
    limit: usize,
) -> Vec<TaskOutcome> {
    let len = specs.len();
    if len == 0 {
        return Vec::new();
    }

    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut set = JoinSet::new();
    let mut index_of = HashMap::with_capacity(len);
    let mut names = Vec::with_capacity(len);

    for (i, spec) in specs.iter().cloned().enumerate() {
        names.push(spec.name.clone());

        // Acquire before spawning: launches happen in input order and the
        // in-flight window never exceeds the limit.
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .expect("cooldown executor semaphore closed");
        let handler = Arc::clone(&handler);

        let id = set
            .spawn(async move {
                let outcome = handler.handle(&spec).await;
                drop(permit);
                outcome
            })
            .id();
        index_of.insert(id, i);
    }

    let mut results: Vec<Option<TaskOutcome>> = Vec::with_capacity(len);
    results.resize_with(len, || None);

    while let Some(joined) = set.join_next_with_id().await {
        match joined {
            Ok((id, outcome)) => {
                if let Some(&i) = index_of.get(&id) {
                    results[i] = Some(outcome);
                }
            }
            // A panic inside one task must not lose the batch.
            Err(join_err) => {
                if let Some(&i) = index_of.get(&join_err.id()) {
                    warn!(task = %names[i], error = %join_err, "Task aborted");
                    results[i] = Some(TaskOutcome::failed(
                        &names[i],
                        ErrorKind::UnknownError,
                        format!("task aborted: {join_err}"),
                    ));
                }
            }
        }
    }

    results
        .into_iter()
        .enumerate()
        .map(|(i, outcome)| {
            outcome.unwrap_or_else(|| {
                TaskOutcome::failed(
                    &names[i],
                    ErrorKind::UnknownError,
                    "task produced no outcome",
                )
            })
        })
        .collect()
}
