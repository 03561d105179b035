// src/task/image.rs

//! Tasks for `image` resources: build, pull, push, tag and remove.

use anyhow::{bail, Context};
use tracing::{debug, info};

use crate::config::model::ImageConfig;
use crate::config::resource::{Resource, ResourceKind};
use crate::engine::context::ExecutionContext;
use crate::exec::BuildRequest;
use crate::fs::walk_files;
use crate::task::factory::mismatched;
use crate::task::name::Name;
use crate::task::staleness::{is_newer, newest};
use crate::task::{Task, TaskFuture};
use crate::types::PullPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageAction {
    Build,
    Pull,
    Push,
    Tag,
    Remove,
}

#[derive(Debug)]
pub struct ImageTask {
    name: Name,
    config: ImageConfig,
    action: ImageAction,
}

fn construct(name: Name, resource: Resource, action: ImageAction) -> Box<dyn Task> {
    match resource {
        Resource::Image(config) => Box::new(ImageTask {
            name,
            config,
            action,
        }),
        other => mismatched(&name, ResourceKind::Image, &other),
    }
}

pub fn build(name: Name, resource: Resource) -> Box<dyn Task> {
    construct(name, resource, ImageAction::Build)
}

pub fn pull(name: Name, resource: Resource) -> Box<dyn Task> {
    construct(name, resource, ImageAction::Pull)
}

pub fn push(name: Name, resource: Resource) -> Box<dyn Task> {
    construct(name, resource, ImageAction::Push)
}

pub fn tag(name: Name, resource: Resource) -> Box<dyn Task> {
    construct(name, resource, ImageAction::Tag)
}

pub fn remove(name: Name, resource: Resource) -> Box<dyn Task> {
    construct(name, resource, ImageAction::Remove)
}

impl ImageTask {
    /// Rebuild when a dependency changed, the image is missing, or any file
    /// in the build context is newer than the image.
    async fn build(&self, ctx: &ExecutionContext, deps_modified: bool) -> anyhow::Result<bool> {
        let backend = ctx.backend();
        let fs = ctx.fs();
        let reference = self.config.reference();
        let context = ctx.working_dir().join(&self.config.context);

        let stale = deps_modified
            || match backend.image_created(&reference).await? {
                None => true,
                Some(created) => {
                    let files = walk_files(fs.as_ref(), &context)?;
                    is_newer(newest(fs.as_ref(), &files)?, created)
                }
            };
        if !stale {
            debug!(task = %self.name, image = %reference, "image is up to date");
            return Ok(false);
        }

        let request = BuildRequest {
            dockerfile: self.config.dockerfile.as_ref().map(|d| context.join(d)),
            context,
            tags: self.config.references(),
            args: self.config.args.clone(),
        };
        backend
            .build_image(&request)
            .await
            .with_context(|| format!("building image {reference}"))?;
        Ok(true)
    }

    async fn pull(&self, ctx: &ExecutionContext) -> anyhow::Result<bool> {
        let backend = ctx.backend();
        let reference = self.config.reference();
        let present = backend.image_created(&reference).await?.is_some();

        match (self.config.pull, present) {
            (PullPolicy::Never, true) | (PullPolicy::Once, true) => {
                debug!(task = %self.name, image = %reference, "image already present");
                Ok(false)
            }
            (PullPolicy::Never, false) => {
                bail!("image {reference} is not present and pull is set to never")
            }
            (PullPolicy::Always, _) | (PullPolicy::Once, false) => {
                info!(task = %self.name, image = %reference, "pulling image");
                backend.pull_image(&reference).await?;
                Ok(true)
            }
        }
    }

    async fn push(&self, ctx: &ExecutionContext) -> anyhow::Result<bool> {
        let backend = ctx.backend();
        for reference in self.config.references() {
            backend
                .push_image(&reference)
                .await
                .with_context(|| format!("pushing image {reference}"))?;
        }
        Ok(true)
    }

    /// Apply the canonical tag's image to every other configured tag.
    async fn tag(&self, ctx: &ExecutionContext) -> anyhow::Result<bool> {
        let backend = ctx.backend();
        let source = self.config.reference();
        let mut tagged = false;
        for target in self.config.references().iter().skip(1) {
            backend.tag_image(&source, target).await?;
            tagged = true;
        }
        Ok(tagged)
    }

    async fn remove(&self, ctx: &ExecutionContext) -> anyhow::Result<bool> {
        let backend = ctx.backend();
        let mut removed = false;
        for reference in self.config.references() {
            if backend.remove_image(&reference).await? {
                debug!(task = %self.name, image = %reference, "removed image");
                removed = true;
            }
        }
        Ok(removed)
    }
}

impl Task for ImageTask {
    fn name(&self) -> &Name {
        &self.name
    }

    fn run<'a>(
        &'a mut self,
        ctx: &'a mut ExecutionContext,
        deps_modified: bool,
    ) -> TaskFuture<'a, bool> {
        Box::pin(async move {
            match self.action {
                ImageAction::Build => self.build(ctx, deps_modified).await,
                ImageAction::Pull => self.pull(ctx).await,
                ImageAction::Push => self.push(ctx).await,
                ImageAction::Tag => self.tag(ctx).await,
                ImageAction::Remove => self.remove(ctx).await,
            }
        })
    }
}
