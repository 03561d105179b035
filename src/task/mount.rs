// src/task/mount.rs

//! Tasks for `mount` resources.
//!
//! `create` makes a missing bind directory on the host, or a missing named
//! volume. `remove` removes a named volume; bind directories are host data
//! and are left alone.

use tracing::{debug, info};

use crate::config::model::MountConfig;
use crate::config::resource::{Resource, ResourceKind};
use crate::engine::context::ExecutionContext;
use crate::task::factory::mismatched;
use crate::task::name::Name;
use crate::task::{Task, TaskFuture};

#[derive(Debug)]
pub struct MountTask {
    name: Name,
    config: MountConfig,
    remove: bool,
}

fn construct(name: Name, resource: Resource, remove: bool) -> Box<dyn Task> {
    match resource {
        Resource::Mount(config) => Box::new(MountTask {
            name,
            config,
            remove,
        }),
        other => mismatched(&name, ResourceKind::Mount, &other),
    }
}

pub fn create(name: Name, resource: Resource) -> Box<dyn Task> {
    construct(name, resource, false)
}

pub fn remove(name: Name, resource: Resource) -> Box<dyn Task> {
    construct(name, resource, true)
}

impl MountTask {
    async fn create(&self, ctx: &ExecutionContext) -> anyhow::Result<bool> {
        if let Some(bind) = &self.config.bind {
            let fs = ctx.fs();
            let host = ctx.working_dir().join(bind);
            if fs.exists(&host) {
                debug!(task = %self.name, path = %host.display(), "bind directory exists");
                return Ok(false);
            }
            info!(task = %self.name, path = %host.display(), "creating bind directory");
            fs.create_dir_all(&host)?;
            return Ok(true);
        }

        match &self.config.name {
            Some(volume) => {
                let backend = ctx.backend();
                let created = backend.ensure_volume(volume).await?;
                Ok(created)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, ctx: &ExecutionContext) -> anyhow::Result<bool> {
        match (&self.config.bind, &self.config.name) {
            (None, Some(volume)) => {
                let backend = ctx.backend();
                let removed = backend.remove_volume(volume).await?;
                Ok(removed)
            }
            _ => Ok(false),
        }
    }
}

impl Task for MountTask {
    fn name(&self) -> &Name {
        &self.name
    }

    fn run<'a>(
        &'a mut self,
        ctx: &'a mut ExecutionContext,
        _deps_modified: bool,
    ) -> TaskFuture<'a, bool> {
        Box::pin(async move {
            if self.remove {
                self.remove(ctx).await
            } else {
                self.create(ctx).await
            }
        })
    }
}
