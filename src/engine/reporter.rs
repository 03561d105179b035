// src/engine/reporter.rs

//! Progress reporting hooks invoked by the executor.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::errors::StevedoreError;
use crate::task::TaskConfig;

/// Receives task lifecycle events from the executor.
///
/// Called at fixed points only: before a task runs, after it completes, and
/// when cleanup of a task fails.
pub trait Reporter: Send + Sync {
    fn task_started(&self, task: &TaskConfig);

    fn task_completed(&self, task: &TaskConfig, modified: bool, elapsed: Duration);

    fn task_stopped(&self, _task: &TaskConfig) {}

    /// A task failed to clean up. Never fatal.
    fn stop_failed(&self, error: &StevedoreError);
}

/// Default reporter: logs through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter {
    quiet: bool,
}

impl TracingReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Reporter for TracingReporter {
    fn task_started(&self, task: &TaskConfig) {
        if self.quiet || task.name().has_action("remove") {
            debug!(task = %task.name(), "{}", task.resource());
        } else {
            info!(task = %task.name(), "{}", task.resource());
        }
    }

    fn task_completed(&self, task: &TaskConfig, modified: bool, elapsed: Duration) {
        debug!(
            task = %task.name(),
            modified,
            elapsed_ms = elapsed.as_millis() as u64,
            "task completed"
        );
    }

    fn task_stopped(&self, task: &TaskConfig) {
        debug!(task = %task.name(), "task stopped");
    }

    fn stop_failed(&self, error: &StevedoreError) {
        warn!("{error}");
    }
}
