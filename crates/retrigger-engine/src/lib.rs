//! Retrigger Task Execution Core
//!
//! This crate holds the pieces that decide and act:
//! - [`executor`]: bounded-concurrency fan-out with positional outcomes,
//! - [`decision`]: the per-task state machine (probe, cooldown gate, dispatch),
//! - [`store`]: the cooldown store contract plus redb and in-memory backends,
//! - [`actuator`]: the outbound probe/dispatch calls,
//! - [`report`]: structured events and best-effort notifications.

pub mod actuator;
pub mod decision;
pub mod executor;
pub mod report;
pub mod store;

// Re-export commonly used types
pub use actuator::{Actuator, ActuatorError, GithubActuator};
pub use decision::DecisionEngine;
pub use executor::{run_batch, TaskHandler};
pub use report::{Notifier, NoopNotifier, Reporter, TelegramNotifier};
pub use store::{CooldownStore, MemoryStore, RedbStore, StoreError};
