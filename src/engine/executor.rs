// src/engine/executor.rs

//! Run a collected task sequence.
//!
//! Tasks run one at a time in collection order. Every task whose `run` was
//! invoked is stopped afterwards, last started first, whatever the outcome.

use std::time::Instant;

use tracing::debug;

use crate::dag::TaskCollection;
use crate::engine::context::ExecutionContext;
use crate::engine::reporter::Reporter;
use crate::errors::{Result, StevedoreError};
use crate::task::{Name, Task, TaskConfig};

/// Result of one task in a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub name: Name,
    pub modified: bool,
}

/// Per-task results of a successful run, in run order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub outcomes: Vec<TaskOutcome>,
}

impl RunSummary {
    pub fn modified(&self) -> impl Iterator<Item = &Name> {
        self.outcomes.iter().filter(|o| o.modified).map(|o| &o.name)
    }

    pub fn any_modified(&self) -> bool {
        self.outcomes.iter().any(|o| o.modified)
    }
}

struct Started<'c> {
    config: &'c TaskConfig,
    task: Box<dyn Task>,
}

/// Run every task in `tasks`, then stop the started ones in reverse order.
///
/// Returns the first failure, naming its task. Failures while stopping are
/// passed to `reporter` and never replace the run result.
pub async fn execute_tasks(
    ctx: &mut ExecutionContext,
    tasks: &TaskCollection,
    reporter: &dyn Reporter,
) -> Result<RunSummary> {
    let mut started: Vec<Started<'_>> = Vec::with_capacity(tasks.len());

    let result = run_tasks(ctx, tasks, reporter, &mut started).await;

    while let Some(mut entry) = started.pop() {
        let name = entry.config.name();
        match entry.task.stop(ctx).await {
            Ok(()) => reporter.task_stopped(entry.config),
            Err(error) => reporter.stop_failed(&StevedoreError::Stop {
                task: name.clone(),
                error,
            }),
        }
    }
    result
}

async fn run_tasks<'c>(
    ctx: &mut ExecutionContext,
    tasks: &'c TaskCollection,
    reporter: &dyn Reporter,
    started: &mut Vec<Started<'c>>,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    for config in tasks {
        let name = config.name();
        let resource =
            config
                .resource()
                .resolve(ctx.env())
                .map_err(|error| StevedoreError::Resolution {
                    task: name.clone(),
                    error,
                })?;
        ctx.add_resource(name.resource(), resource.clone());

        // Recorded before running so cleanup reaches it even if `run` fails.
        let index = started.len();
        started.push(Started {
            config,
            task: config.task(resource),
        });

        let deps_modified = ctx.any_modified(config.dependencies());
        reporter.task_started(config);
        let begin = Instant::now();

        let modified = started[index]
            .task
            .run(ctx, deps_modified)
            .await
            .map_err(|error| StevedoreError::Run {
                task: name.clone(),
                error,
            })?;

        reporter.task_completed(config, modified, begin.elapsed());
        if modified {
            ctx.set_modified(name);
        }
        debug!(task = %name, deps_modified, modified, "task finished");
        summary.outcomes.push(TaskOutcome {
            name: name.clone(),
            modified,
        });
    }

    Ok(summary)
}
