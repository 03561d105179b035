// src/dag/collector.rs

//! Expand requested task names into a dependency-first run order.
//!
//! Expansion is depth first. A name is appended after all of its
//! dependencies, so every task appears after the tasks it depends on.
//! Expanded names are not memoized across sibling branches: a dependency
//! shared by two tasks is collected once for each path that reaches it.

use tracing::debug;

use crate::config::model::ConfigFile;
use crate::dag::stack::ActiveStack;
use crate::errors::{Result, StevedoreError};
use crate::task::factory::task_config;
use crate::task::{Name, TaskConfig};

/// Ordered task configs, dependencies first.
#[derive(Debug, Clone, Default)]
pub struct TaskCollection {
    tasks: Vec<TaskConfig>,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, task: TaskConfig) {
        self.tasks.push(task);
    }

    pub fn all(&self) -> &[TaskConfig] {
        &self.tasks
    }

    /// First task config with `name`.
    pub fn get(&self, name: &Name) -> Option<&TaskConfig> {
        self.tasks.iter().find(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Names in run order.
    pub fn names(&self) -> Vec<Name> {
        self.tasks.iter().map(|t| t.name().clone()).collect()
    }
}

impl From<Vec<TaskConfig>> for TaskCollection {
    fn from(tasks: Vec<TaskConfig>) -> Self {
        Self { tasks }
    }
}

impl<'a> IntoIterator for &'a TaskCollection {
    type Item = &'a TaskConfig;
    type IntoIter = std::slice::Iter<'a, TaskConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

/// Parse `requested` and collect every task they need, in run order.
///
/// Fails without side effects on a malformed name, an unknown resource or
/// action, or a dependency cycle.
pub fn collect_tasks<S: AsRef<str>>(requested: &[S], cfg: &ConfigFile) -> Result<TaskCollection> {
    let names = crate::task::parse_names(requested)?;
    collect_names(&names, cfg)
}

/// Collect already parsed names.
pub fn collect_names(names: &[Name], cfg: &ConfigFile) -> Result<TaskCollection> {
    let mut stack = ActiveStack::new();
    let mut tasks = TaskCollection::new();
    for name in names {
        collect(name, cfg, &mut stack, &mut tasks)?;
    }
    debug!(count = tasks.len(), "collected tasks");
    Ok(tasks)
}

fn collect(
    name: &Name,
    cfg: &ConfigFile,
    stack: &mut ActiveStack,
    tasks: &mut TaskCollection,
) -> Result<()> {
    let resource = cfg
        .resource(name.resource())
        .ok_or_else(|| StevedoreError::UnknownResource(name.resource().to_string()))?;

    let config = task_config(name, resource, cfg)?;
    let name = config.name().clone();

    if stack.contains(&name) {
        return Err(StevedoreError::CyclicDependency { path: stack.path() });
    }

    stack.push(name);
    for dep in config.dependencies() {
        collect(dep, cfg, stack, tasks)?;
    }
    tasks.push(config);
    stack.pop();
    Ok(())
}
