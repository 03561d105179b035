// src/task/alias.rs

//! Tasks for `alias` resources. An alias does no work of its own; it is
//! modified whenever one of the tasks it lists was.

use crate::config::resource::{Resource, ResourceKind};
use crate::engine::context::ExecutionContext;
use crate::task::factory::mismatched;
use crate::task::name::Name;
use crate::task::{Task, TaskFuture};

#[derive(Debug)]
pub struct AliasTask {
    name: Name,
}

fn construct(name: Name, resource: Resource) -> Box<dyn Task> {
    match resource {
        Resource::Alias(_) => Box::new(AliasTask { name }),
        other => mismatched(&name, ResourceKind::Alias, &other),
    }
}

pub fn run(name: Name, resource: Resource) -> Box<dyn Task> {
    construct(name, resource)
}

/// The listed `remove` tasks are dependencies; the alias itself is a no-op.
pub fn remove(name: Name, resource: Resource) -> Box<dyn Task> {
    construct(name, resource)
}

impl Task for AliasTask {
    fn name(&self) -> &Name {
        &self.name
    }

    fn run<'a>(
        &'a mut self,
        _ctx: &'a mut ExecutionContext,
        deps_modified: bool,
    ) -> TaskFuture<'a, bool> {
        Box::pin(async move { Ok(deps_modified) })
    }
}
