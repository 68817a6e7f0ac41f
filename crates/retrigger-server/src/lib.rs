//! Retrigger Server Library
//!
//! Wires the execution core to its external callers: environment
//! configuration, the task file, the interval scheduler, and the HTTP
//! on-demand trigger.

pub mod config;
pub mod http;
pub mod state;

pub use config::{Config, ConfigError};
pub use state::AppState;
