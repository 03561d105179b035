// src/task/mod.rs

//! Runtime tasks.
//!
//! - [`name`] parses `resource[:action]` identifiers.
//! - [`factory`] maps a resource kind and action to its dependencies and
//!   task constructor.
//! - one module per resource kind holds that kind's task implementations and
//!   staleness policy.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::resource::Resource;
use crate::engine::context::ExecutionContext;

pub mod alias;
pub mod compose;
pub mod env;
pub mod factory;
pub mod image;
pub mod job;
pub mod mount;
pub mod name;
pub mod staleness;
pub mod volume;

pub use name::{parse_names, Name};

/// Boxed future returned by task operations.
pub type TaskFuture<'a, T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// Builds the runtime task for one resolved resource.
pub type TaskConstructor = Arc<dyn Fn(Name, Resource) -> Box<dyn Task> + Send + Sync>;

/// Runtime behaviour of one task.
///
/// `run` applies the task's own staleness policy and reports whether it did
/// any work. `stop` is called once for every task whose `run` was invoked,
/// in reverse order, whether or not the run succeeded.
pub trait Task: Send + fmt::Debug {
    fn name(&self) -> &Name;

    /// Run the task. `deps_modified` is true if any dependency did work
    /// earlier in this run. Returns whether this task did work.
    fn run<'a>(
        &'a mut self,
        ctx: &'a mut ExecutionContext,
        deps_modified: bool,
    ) -> TaskFuture<'a, bool>;

    fn stop<'a>(&'a mut self, _ctx: &'a mut ExecutionContext) -> TaskFuture<'a, ()> {
        Box::pin(async { Ok(()) })
    }
}

/// Static binding of a canonical [`Name`] to its resource and dependencies.
#[derive(Clone)]
pub struct TaskConfig {
    name: Name,
    resource: Resource,
    dependencies: Vec<Name>,
    constructor: TaskConstructor,
}

impl TaskConfig {
    pub fn new<F>(name: Name, resource: Resource, dependencies: Vec<Name>, constructor: F) -> Self
    where
        F: Fn(Name, Resource) -> Box<dyn Task> + Send + Sync + 'static,
    {
        Self {
            name,
            resource,
            dependencies,
            constructor: Arc::new(constructor),
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    /// The resource as declared (unresolved).
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn dependencies(&self) -> &[Name] {
        &self.dependencies
    }

    /// Create the runtime task for a (resolved) copy of this config's
    /// resource.
    pub fn task(&self, resource: Resource) -> Box<dyn Task> {
        (self.constructor)(self.name.clone(), resource)
    }
}

impl fmt::Debug for TaskConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskConfig")
            .field("name", &self.name)
            .field("kind", &self.resource.kind())
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for TaskConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.resource)
    }
}
