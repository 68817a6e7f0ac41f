//! Core domain errors.

use thiserror::Error;

/// Core domain errors for retrigger.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Conditional task is missing its check URL.
    #[error("Conditional task '{0}' has no check_url")]
    MissingCheckUrl(String),

    /// Conditional task has no trigger status codes to match against.
    #[error("Conditional task '{0}' has no trigger_status_codes")]
    MissingTriggerCodes(String),

    /// A dispatch target field is empty.
    #[error("Task '{task}' has an empty dispatch field: {field}")]
    EmptyDispatchField { task: String, field: &'static str },

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
