// src/task/compose.rs

//! Tasks for `compose` resources.
//!
//! - `up`: start the project detached; take it down on stop
//! - `attach`: run the project in the foreground; take it down on stop
//! - `detach`: start the project detached and leave it running
//! - `down` / `remove`: take the project down

use anyhow::Context;
use tracing::info;

use crate::config::model::ComposeConfig;
use crate::config::resource::{Resource, ResourceKind};
use crate::engine::context::ExecutionContext;
use crate::exec::{ComposeCommand, ComposeRequest};
use crate::task::factory::mismatched;
use crate::task::name::Name;
use crate::task::{Task, TaskFuture};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComposeAction {
    Up,
    Attach,
    Detach,
    Down,
}

#[derive(Debug)]
pub struct ComposeTask {
    name: Name,
    config: ComposeConfig,
    action: ComposeAction,
    /// Set once the project was started by this task.
    started: bool,
}

fn construct(name: Name, resource: Resource, action: ComposeAction) -> Box<dyn Task> {
    match resource {
        Resource::Compose(config) => Box::new(ComposeTask {
            name,
            config,
            action,
            started: false,
        }),
        other => mismatched(&name, ResourceKind::Compose, &other),
    }
}

pub fn up(name: Name, resource: Resource) -> Box<dyn Task> {
    construct(name, resource, ComposeAction::Up)
}

pub fn attach(name: Name, resource: Resource) -> Box<dyn Task> {
    construct(name, resource, ComposeAction::Attach)
}

pub fn detach(name: Name, resource: Resource) -> Box<dyn Task> {
    construct(name, resource, ComposeAction::Detach)
}

pub fn down(name: Name, resource: Resource) -> Box<dyn Task> {
    construct(name, resource, ComposeAction::Down)
}

impl ComposeTask {
    fn request(&self, ctx: &ExecutionContext, command: ComposeCommand) -> ComposeRequest {
        ComposeRequest {
            project: self.config.project_name().to_string(),
            files: self
                .config
                .files
                .iter()
                .map(|f| ctx.working_dir().join(f))
                .collect(),
            command,
        }
    }
}

impl Task for ComposeTask {
    fn name(&self) -> &Name {
        &self.name
    }

    fn run<'a>(
        &'a mut self,
        ctx: &'a mut ExecutionContext,
        _deps_modified: bool,
    ) -> TaskFuture<'a, bool> {
        Box::pin(async move {
            let command = match self.action {
                ComposeAction::Up | ComposeAction::Detach => ComposeCommand::Up { detach: true },
                ComposeAction::Attach => ComposeCommand::Up { detach: false },
                ComposeAction::Down => ComposeCommand::Down,
            };
            let request = self.request(ctx, command);
            let backend = ctx.backend();

            info!(task = %self.name, project = %request.project, "running compose");
            // A partially started project is still taken down on stop.
            self.started = matches!(self.action, ComposeAction::Up | ComposeAction::Attach);
            backend
                .compose(&request)
                .await
                .with_context(|| format!("compose project {}", request.project))?;
            Ok(true)
        })
    }

    fn stop<'a>(&'a mut self, ctx: &'a mut ExecutionContext) -> TaskFuture<'a, ()> {
        Box::pin(async move {
            if !std::mem::take(&mut self.started) {
                return Ok(());
            }
            let request = self.request(ctx, ComposeCommand::Down);
            let backend = ctx.backend();
            backend
                .compose(&request)
                .await
                .with_context(|| format!("stopping compose project {}", request.project))
        })
    }
}
