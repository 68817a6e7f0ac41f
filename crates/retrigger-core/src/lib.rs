//! Retrigger Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Database
//! - Runtime specifics
//!
//! All types here represent the core business domain of retrigger:
//! task specifications, per-task outcomes, and the error taxonomy.

pub mod error;
pub mod key;
pub mod outcome;
pub mod task;

// Re-export commonly used types
pub use error::CoreError;
pub use key::{dedup_key, scheduled_dedup_key};
pub use outcome::{BatchSummary, ErrorKind, OutcomeStatus, SkipReason, TaskOutcome};
pub use task::{DispatchTarget, RunId, TaskEntry, TaskMode, TaskSpec};
