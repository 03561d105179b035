// src/dag/mod.rs

//! Dependency expansion.
//!
//! - [`collector`] expands requested names into a dependency-first
//!   [`TaskCollection`].
//! - [`stack`] holds the active expansion path used for cycle detection.
//! - [`graph`] renders a collection as Graphviz DOT.

pub mod collector;
pub mod graph;
pub mod stack;

pub use collector::{collect_names, collect_tasks, TaskCollection};
pub use graph::to_dot;
pub use stack::ActiveStack;
