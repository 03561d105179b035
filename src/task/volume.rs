// src/task/volume.rs

//! Tasks for `volume` resources: host directories created on demand.

use tracing::info;

use crate::config::model::VolumeConfig;
use crate::config::resource::{Resource, ResourceKind};
use crate::engine::context::ExecutionContext;
use crate::task::factory::mismatched;
use crate::task::name::Name;
use crate::task::{Task, TaskFuture};

#[derive(Debug)]
pub struct VolumeTask {
    name: Name,
    config: VolumeConfig,
    remove: bool,
}

fn construct(name: Name, resource: Resource, remove: bool) -> Box<dyn Task> {
    match resource {
        Resource::Volume(config) => Box::new(VolumeTask {
            name,
            config,
            remove,
        }),
        other => mismatched(&name, ResourceKind::Volume, &other),
    }
}

pub fn create(name: Name, resource: Resource) -> Box<dyn Task> {
    construct(name, resource, false)
}

/// Host data is never deleted; removing a volume does nothing.
pub fn remove(name: Name, resource: Resource) -> Box<dyn Task> {
    construct(name, resource, true)
}

impl Task for VolumeTask {
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
                return Ok(false);
            }
            let fs = ctx.fs();
            let path = ctx.working_dir().join(&self.config.path);
            if fs.is_dir(&path) {
                return Ok(false);
            }
            info!(task = %self.name, path = %path.display(), "creating volume directory");
            fs.create_dir_all(&path)?;
            Ok(true)
        })
    }
}
