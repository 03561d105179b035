// src/engine/mod.rs

//! Execution engine.
//!
//! - [`context`] holds the per-run mutable state lent to each task.
//! - [`executor`] runs a collected sequence and guarantees reverse-order
//!   cleanup of every started task.
//! - [`reporter`] receives task lifecycle events.

pub mod context;
pub mod executor;
pub mod reporter;

pub use context::{ExecutionContext, Settings};
pub use executor::{execute_tasks, RunSummary, TaskOutcome};
pub use reporter::{Reporter, TracingReporter};
