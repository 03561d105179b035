// src/task/job.rs

//! Tasks for `job` resources: run a command in a container, or remove the
//! job's container.
//!
//! A job without `artifact` always runs. Otherwise it runs when a dependency
//! changed, an artifact is missing, or a source is newer than the oldest
//! artifact. Without explicit `sources`, the sources are the job's image and
//! the files under its bind mounts.

use std::path::PathBuf;
use std::time::SystemTime;

use anyhow::{bail, Context};
use tracing::{debug, info};

use crate::config::model::{Device, JobConfig};
use crate::config::resource::{Resource, ResourceKind};
use crate::engine::context::ExecutionContext;
use crate::exec::{ContainerSpec, CopySpec, MountSpec};
use crate::task::factory::mismatched;
use crate::task::name::Name;
use crate::task::staleness::{expand_patterns, is_newer, newest, oldest_existing};
use crate::task::{Task, TaskFuture};

const DOCKER_SOCKET: &str = "/var/run/docker.sock";

#[derive(Debug)]
pub struct RunJob {
    name: Name,
    config: JobConfig,
    /// Container left behind by `run`, removed on stop.
    container: Option<String>,
}

#[derive(Debug)]
pub struct RemoveJob {
    name: Name,
}

pub fn run(name: Name, resource: Resource) -> Box<dyn Task> {
    match resource {
        Resource::Job(config) => Box::new(RunJob {
            name,
            config,
            container: None,
        }),
        other => mismatched(&name, ResourceKind::Job, &other),
    }
}

pub fn remove(name: Name, resource: Resource) -> Box<dyn Task> {
    match resource {
        Resource::Job(_) => Box::new(RemoveJob { name }),
        other => mismatched(&name, ResourceKind::Job, &other),
    }
}

/// Name of the container a job runs in: `{project}-{exec-id}-{resource}`,
/// restricted to characters the engine accepts.
pub fn container_name(ctx: &ExecutionContext, resource: &str) -> String {
    let raw = format!("{}-{}-{}", ctx.env().project(), ctx.env().exec_id(), resource);
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') { c } else { '-' })
        .collect()
}

/// Host directory of one attached mount.
struct HostMount {
    host: PathBuf,
    container: String,
    read_only: bool,
}

enum Attached {
    Host(HostMount),
    Volume(MountSpec),
}

impl RunJob {
    fn image(&self, ctx: &ExecutionContext) -> anyhow::Result<String> {
        match ctx.resource(&self.config.use_image) {
            Some(Resource::Image(image)) => Ok(image.reference()),
            _ => bail!("image {:?} has not been resolved", self.config.use_image),
        }
    }

    fn attached(&self, ctx: &ExecutionContext) -> anyhow::Result<Vec<Attached>> {
        let mut attached = Vec::new();
        for mount in &self.config.mounts {
            let entry = match ctx.resource(mount) {
                Some(Resource::Mount(m)) => match (&m.bind, &m.name) {
                    (Some(bind), _) => Attached::Host(HostMount {
                        host: ctx.working_dir().join(bind),
                        container: m.path.clone(),
                        read_only: m.read_only,
                    }),
                    (None, Some(volume)) => Attached::Volume(MountSpec::Volume {
                        name: volume.clone(),
                        container: m.path.clone(),
                        read_only: m.read_only,
                    }),
                    (None, None) => bail!("mount {mount:?} has neither bind nor name"),
                },
                Some(Resource::Volume(v)) => Attached::Host(HostMount {
                    host: ctx.working_dir().join(&v.path),
                    container: v.mount.clone(),
                    read_only: v.mode.is_read_only(),
                }),
                _ => bail!("mount {mount:?} has not been resolved"),
            };
            attached.push(entry);
        }
        Ok(attached)
    }

    async fn is_stale(&self, ctx: &ExecutionContext, deps_modified: bool) -> anyhow::Result<bool> {
        if self.config.artifact.is_empty() || deps_modified {
            return Ok(true);
        }
        let fs = ctx.fs();
        let root = ctx.working_dir();

        let artifacts = expand_patterns(fs.as_ref(), root, &self.config.artifact)?;
        let Some(oldest_artifact) = oldest_existing(fs.as_ref(), &artifacts)? else {
            debug!(task = %self.name, "artifact missing");
            return Ok(true);
        };

        let newest_source = if self.config.sources.is_empty() {
            self.default_sources_time(ctx).await?
        } else {
            let sources = expand_patterns(fs.as_ref(), root, &self.config.sources)?;
            newest(fs.as_ref(), &sources)?
        };
        Ok(is_newer(newest_source, oldest_artifact))
    }

    /// Newest of the image creation time and the files under bind mounts.
    async fn default_sources_time(&self, ctx: &ExecutionContext) -> anyhow::Result<Option<SystemTime>> {
        let image = self.image(ctx)?;
        let created = ctx.backend().image_created(&image).await?;

        let fs = ctx.fs();
        let hosts: Vec<PathBuf> = self
            .attached(ctx)?
            .into_iter()
            .filter_map(|a| match a {
                Attached::Host(m) => Some(m.host),
                Attached::Volume(_) => None,
            })
            .collect();
        let files = newest(fs.as_ref(), &hosts)?;
        Ok(created.max(files))
    }

    fn container_spec(&self, ctx: &ExecutionContext, name: String) -> anyhow::Result<ContainerSpec> {
        let settings = ctx.settings();
        let mut spec = ContainerSpec {
            name,
            image: self.image(ctx)?,
            command: self.config.command_args(),
            entrypoint: self.config.entrypoint_args(),
            env: self.config.env.clone(),
            working_dir: self.config.working_dir.clone(),
            user: self.config.user.clone(),
            net_mode: self.config.net_mode.clone(),
            ports: self.config.ports.clone(),
            devices: self.config.devices.iter().map(Device::spec).collect(),
            privileged: self.config.privileged,
            interactive: self.config.interactive,
            labels: self.config.labels.clone(),
            ..ContainerSpec::default()
        };

        for attached in self.attached(ctx)? {
            match attached {
                Attached::Volume(volume) => spec.mounts.push(volume),
                Attached::Host(m) if settings.bind_mount => spec.mounts.push(MountSpec::Bind {
                    host: m.host,
                    container: m.container,
                    read_only: m.read_only,
                }),
                Attached::Host(m) => {
                    // `dir/.` copies the directory's contents rather than the directory.
                    spec.copy_in.push(CopySpec {
                        host: m.host.join("."),
                        container: m.container.clone(),
                    });
                    if !m.read_only {
                        spec.copy_out.push(CopySpec {
                            host: m.host,
                            container: format!("{}/.", m.container.trim_end_matches('/')),
                        });
                    }
                }
            }
        }

        if self.config.provide_docker {
            spec.mounts.push(MountSpec::Bind {
                host: PathBuf::from(DOCKER_SOCKET),
                container: DOCKER_SOCKET.to_string(),
                read_only: false,
            });
            spec.env.extend(
                ctx.env()
                    .vars_with_prefix("DOCKER_")
                    .map(|(k, v)| format!("{k}={v}")),
            );
        }
        Ok(spec)
    }
}

impl Task for RunJob {
    fn name(&self) -> &Name {
        &self.name
    }

    fn run<'a>(
        &'a mut self,
        ctx: &'a mut ExecutionContext,
        deps_modified: bool,
    ) -> TaskFuture<'a, bool> {
        Box::pin(async move {
            if !self.is_stale(ctx, deps_modified).await? {
                debug!(task = %self.name, "artifacts are up to date");
                return Ok(false);
            }

            let backend = ctx.backend();
            let container = container_name(ctx, self.name.resource());
            let spec = self.container_spec(ctx, container.clone())?;

            // A container left by an interrupted run would clash on name.
            backend.remove_container(&container).await?;
            self.container = Some(container.clone());

            info!(task = %self.name, container = %container, image = %spec.image, "running job");
            let code = backend
                .run_container(&spec)
                .await
                .with_context(|| format!("running container {container}"))?;
            if code != 0 {
                bail!("container {container} exited with code {code}");
            }
            Ok(true)
        })
    }

    fn stop<'a>(&'a mut self, ctx: &'a mut ExecutionContext) -> TaskFuture<'a, ()> {
        Box::pin(async move {
            if let Some(container) = self.container.take() {
                let backend = ctx.backend();
                backend
                    .remove_container(&container)
                    .await
                    .with_context(|| format!("removing container {container}"))?;
            }
            Ok(())
        })
    }
}

impl Task for RemoveJob {
    fn name(&self) -> &Name {
        &self.name
    }

    fn run<'a>(
        &'a mut self,
        ctx: &'a mut ExecutionContext,
        _deps_modified: bool,
    ) -> TaskFuture<'a, bool> {
        Box::pin(async move {
            let backend = ctx.backend();
            let container = container_name(ctx, self.name.resource());
            let removed = backend.remove_container(&container).await?;
            Ok(removed)
        })
    }
}
