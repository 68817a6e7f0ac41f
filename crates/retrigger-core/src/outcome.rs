//! Per-task outcomes and the batch summary.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Terminal state of one processed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeStatus {
    /// The workflow dispatch was issued.
    Triggered,
    /// The task decided not to dispatch.
    Skipped,
    /// Probe, dispatch, or store access failed.
    Failed,
}

/// Why a task was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The probe status code was not in the trigger set.
    StatusCodeNotTrigger,
    /// A cooldown record younger than the window exists for the dedup key.
    CooldownActive,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatusCodeNotTrigger => write!(f, "status_code_not_trigger"),
            Self::CooldownActive => write!(f, "cooldown_active"),
        }
    }
}

/// Advisory classification of a task failure.
///
/// Set at the point of failure from structured error data (never inferred
/// from message text) and used only for observability. It must never steer
/// control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Remote rejected the credential (401/403).
    AuthError,
    /// Remote target does not exist (404).
    NotFound,
    /// Remote throttled the request (429).
    RateLimit,
    /// Remote server error (5xx).
    ServerError,
    /// The operation exceeded its timeout.
    Timeout,
    /// Transport-level failure (DNS, connect, TLS).
    NetworkError,
    /// Anything unclassified.
    UnknownError,
}

impl ErrorKind {
    /// Classify a remote HTTP status code.
    pub fn from_status(code: u16) -> Self {
        match code {
            401 | 403 => Self::AuthError,
            404 => Self::NotFound,
            429 => Self::RateLimit,
            500..=599 => Self::ServerError,
            _ => Self::UnknownError,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AuthError => "AUTH_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::RateLimit => "RATE_LIMIT",
            Self::ServerError => "SERVER_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::NetworkError => "NETWORK_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        };
        write!(f, "{s}")
    }
}

/// Result of processing one task. Produced once per task per run; never
/// persisted (only the cooldown timestamp is).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    /// Name of the task this outcome belongs to.
    pub task: String,

    /// Terminal state.
    pub status: OutcomeStatus,

    /// Machine-readable reason string (`condition_met`, `scheduled`,
    /// `status_code_not_trigger`, `cooldown_active`, or the error kind).
    pub reason: String,

    /// Remaining cooldown, present only for cooldown skips.
    pub remaining: Option<Duration>,

    /// Failure classification, present only for failed outcomes.
    pub error_kind: Option<ErrorKind>,

    /// Failure message, present only for failed outcomes.
    pub error: Option<String>,
}

impl TaskOutcome {
    /// A dispatch that happened because the probe condition was met.
    pub fn condition_met(task: impl Into<String>) -> Self {
        Self::triggered(task, "condition_met")
    }

    /// A dispatch that happened unconditionally on schedule.
    pub fn scheduled(task: impl Into<String>) -> Self {
        Self::triggered(task, "scheduled")
    }

    fn triggered(task: impl Into<String>, reason: &str) -> Self {
        Self {
            task: task.into(),
            status: OutcomeStatus::Triggered,
            reason: reason.to_string(),
            remaining: None,
            error_kind: None,
            error: None,
        }
    }

    /// A skip because the probe status code was not in the trigger set.
    pub fn status_not_trigger(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            status: OutcomeStatus::Skipped,
            reason: SkipReason::StatusCodeNotTrigger.to_string(),
            remaining: None,
            error_kind: None,
            error: None,
        }
    }

    /// A skip because the cooldown window is still active, with the
    /// remaining wait time.
    pub fn cooldown_active(task: impl Into<String>, remaining: Duration) -> Self {
        Self {
            task: task.into(),
            status: OutcomeStatus::Skipped,
            reason: SkipReason::CooldownActive.to_string(),
            remaining: Some(remaining),
            error_kind: None,
            error: None,
        }
    }

    /// A contained task failure.
    pub fn failed(task: impl Into<String>, kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            status: OutcomeStatus::Failed,
            reason: kind.to_string(),
            remaining: None,
            error_kind: Some(kind),
            error: Some(error.into()),
        }
    }

    /// The skip reason, if this outcome is a skip.
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self.reason.as_str() {
            "status_code_not_trigger" => Some(SkipReason::StatusCodeNotTrigger),
            "cooldown_active" => Some(SkipReason::CooldownActive),
            _ => None,
        }
    }
}

/// Aggregate counts for one batch run. The only failure information
/// visible to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub triggered: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// Tally a list of outcomes.
    pub fn from_outcomes(outcomes: &[TaskOutcome]) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome.status {
                OutcomeStatus::Triggered => summary.triggered += 1,
                OutcomeStatus::Skipped => summary.skipped += 1,
                OutcomeStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tasks: {} triggered, {} skipped, {} failed",
            self.total, self.triggered, self.skipped, self.failed
        )
    }
}
