use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use stevedore::config::{AliasConfig, Resource};
use stevedore::dag::TaskCollection;
use stevedore::engine::{ExecutionContext, Reporter};
use stevedore::errors::StevedoreError;
use stevedore::task::{Name, Task, TaskConfig, TaskFuture};

/// Something a [`ScriptedTask`] or [`RecordingReporter`] observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Run { task: String, deps_modified: bool },
    Stop { task: String },
}

/// Shared, ordered log of task events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Names of tasks whose `run` was called, in order.
    pub fn runs(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Run { task, .. } => Some(task),
                Event::Stop { .. } => None,
            })
            .collect()
    }

    /// Names of tasks whose `stop` was called, in order.
    pub fn stops(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Stop { task } => Some(task),
                Event::Run { .. } => None,
            })
            .collect()
    }

    /// The `deps_modified` flag each run of `task` observed.
    pub fn deps_modified_of(&self, task: &str) -> Vec<bool> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Run { task: t, deps_modified } if t == task => Some(deps_modified),
                _ => None,
            })
            .collect()
    }
}

/// What a scripted task does when run and stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Script {
    pub modified: bool,
    pub fail_run: bool,
    pub fail_stop: bool,
}

impl Script {
    pub fn modified() -> Self {
        Self {
            modified: true,
            ..Self::default()
        }
    }

    pub fn unmodified() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_run: true,
            ..Self::default()
        }
    }

    pub fn failing_stop(self) -> Self {
        Self {
            fail_stop: true,
            ..self
        }
    }
}

/// A task that records its calls and returns scripted results.
#[derive(Debug)]
pub struct ScriptedTask {
    name: Name,
    script: Script,
    log: EventLog,
}

impl Task for ScriptedTask {
    fn name(&self) -> &Name {
        &self.name
    }

    fn run<'a>(
        &'a mut self,
        _ctx: &'a mut ExecutionContext,
        deps_modified: bool,
    ) -> TaskFuture<'a, bool> {
        Box::pin(async move {
            self.log.push(Event::Run {
                task: self.name.to_string(),
                deps_modified,
            });
            if self.script.fail_run {
                bail!("scripted failure");
            }
            Ok(self.script.modified)
        })
    }

    fn stop<'a>(&'a mut self, _ctx: &'a mut ExecutionContext) -> TaskFuture<'a, ()> {
        Box::pin(async move {
            self.log.push(Event::Stop {
                task: self.name.to_string(),
            });
            if self.script.fail_stop {
                bail!("scripted stop failure");
            }
            Ok(())
        })
    }
}

/// Builds a [`TaskCollection`] of scripted tasks, bypassing config and
/// collection.
///
/// Every task is backed by an empty alias resource so the executor's
/// resolution step succeeds.
#[derive(Debug, Default)]
pub struct ScriptedPlan {
    log: EventLog,
    tasks: Vec<TaskConfig>,
}

impl ScriptedPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> EventLog {
        self.log.clone()
    }

    /// Add task `name` (`resource:action`) depending on `deps`.
    pub fn task(mut self, name: &str, deps: &[&str], script: Script) -> Self {
        let name = Name::parse(name).unwrap();
        let deps = deps.iter().map(|d| Name::parse(d).unwrap()).collect();
        let log = self.log.clone();
        let resource = Resource::Alias(AliasConfig::default());
        self.tasks.push(TaskConfig::new(name, resource, deps, move |name, _resource| {
            Box::new(ScriptedTask {
                name,
                script,
                log: log.clone(),
            }) as Box<dyn Task>
        }));
        self
    }

    pub fn build(self) -> (TaskCollection, EventLog) {
        (TaskCollection::from(self.tasks), self.log)
    }
}

/// Reporter that records what the executor told it.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    started: Arc<Mutex<Vec<String>>>,
    completed: Arc<Mutex<HashMap<String, bool>>>,
    stop_failures: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    /// Whether `task` completed, and if so whether it was modified.
    pub fn completed(&self, task: &str) -> Option<bool> {
        self.completed.lock().unwrap().get(task).copied()
    }

    pub fn stop_failures(&self) -> Vec<String> {
        self.stop_failures.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn task_started(&self, task: &TaskConfig) {
        self.started.lock().unwrap().push(task.name().to_string());
    }

    fn task_completed(&self, task: &TaskConfig, modified: bool, _elapsed: Duration) {
        self.completed
            .lock()
            .unwrap()
            .insert(task.name().to_string(), modified);
    }

    fn stop_failed(&self, error: &StevedoreError) {
        self.stop_failures.lock().unwrap().push(error.to_string());
    }
}
