// src/config/resource.rs

//! The closed set of resource kinds and the operations the engine needs from
//! every resource: dependencies, validation and variable resolution.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, ensure};
use globset::Glob;

use crate::config::model::{
    AliasConfig, Annotations, ComposeConfig, EnvConfig, ImageConfig, JobConfig, MountConfig,
    VolumeConfig,
};
use crate::config::resolve::{ExecEnv, ResolveError};
use crate::errors::Result;
use crate::task::name::{parse_names, Name};

/// All resources of one invocation, keyed by resource name.
pub type Registry = BTreeMap<String, Resource>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Image,
    Job,
    Mount,
    Alias,
    Env,
    Compose,
    Volume,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Job => "job",
            ResourceKind::Mount => "mount",
            ResourceKind::Alias => "alias",
            ResourceKind::Env => "env",
            ResourceKind::Compose => "compose",
            ResourceKind::Volume => "volume",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared resource. Immutable; `resolve` returns a substituted copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Image(ImageConfig),
    Job(JobConfig),
    Mount(MountConfig),
    Alias(AliasConfig),
    Env(EnvConfig),
    Compose(ComposeConfig),
    Volume(VolumeConfig),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Image(_) => ResourceKind::Image,
            Resource::Job(_) => ResourceKind::Job,
            Resource::Mount(_) => ResourceKind::Mount,
            Resource::Alias(_) => ResourceKind::Alias,
            Resource::Env(_) => ResourceKind::Env,
            Resource::Compose(_) => ResourceKind::Compose,
            Resource::Volume(_) => ResourceKind::Volume,
        }
    }

    pub fn annotations(&self) -> &Annotations {
        match self {
            Resource::Image(c) => &c.annotations,
            Resource::Job(c) => &c.annotations,
            Resource::Mount(c) => &c.annotations,
            Resource::Alias(c) => &c.annotations,
            Resource::Env(c) => &c.annotations,
            Resource::Compose(c) => &c.annotations,
            Resource::Volume(c) => &c.annotations,
        }
    }

    /// Names this resource depends on, explicit and implicit.
    ///
    /// A job depends on its mounts, its `depends` list and its image, in
    /// that order.
    pub fn dependencies(&self) -> Result<Vec<Name>> {
        match self {
            Resource::Image(c) => parse_names(&c.depends),
            Resource::Job(c) => {
                let mut deps = parse_names(&c.mounts)?;
                deps.extend(parse_names(&c.depends)?);
                deps.push(Name::parse(&c.use_image)?);
                Ok(deps)
            }
            Resource::Alias(c) => parse_names(&c.tasks),
            Resource::Compose(c) => parse_names(&c.depends),
            Resource::Mount(_) | Resource::Env(_) | Resource::Volume(_) => Ok(Vec::new()),
        }
    }

    /// Check field values and references to other resources.
    pub fn validate(&self, registry: &Registry) -> anyhow::Result<()> {
        self.dependencies().map_err(anyhow::Error::from)?;
        match self {
            Resource::Image(c) => {
                ensure!(!c.image.is_empty(), "image: must not be empty");
                for tag in &c.tags {
                    ensure!(!tag.is_empty(), "tags: tags must not be empty");
                }
                Ok(())
            }
            Resource::Job(c) => validate_job(c, registry),
            Resource::Mount(c) => {
                match (&c.bind, &c.name) {
                    (Some(_), Some(_)) => bail!("only one of bind or name may be set"),
                    (None, None) => bail!("one of bind or name is required"),
                    _ => {}
                }
                ensure!(
                    c.path.starts_with('/'),
                    "path: {:?} must be an absolute container path",
                    c.path
                );
                Ok(())
            }
            Resource::Alias(c) => {
                ensure!(!c.tasks.is_empty(), "tasks: at least one task is required");
                Ok(())
            }
            Resource::Env(c) => {
                for var in &c.variables {
                    ensure!(
                        var.contains('='),
                        "variables: {var:?} must be of the form KEY=VALUE"
                    );
                }
                Ok(())
            }
            Resource::Compose(c) => {
                ensure!(!c.files.is_empty(), "files: at least one file is required");
                Ok(())
            }
            Resource::Volume(c) => {
                ensure!(!c.path.is_empty(), "path: must not be empty");
                ensure!(
                    c.mount.starts_with('/'),
                    "mount: {:?} must be an absolute container path",
                    c.mount
                );
                Ok(())
            }
        }
    }

    /// Copy of this resource with variables substituted from `env`.
    pub fn resolve(&self, env: &ExecEnv) -> std::result::Result<Resource, ResolveError> {
        let resolved = match self {
            Resource::Image(c) => Resource::Image(ImageConfig {
                image: env.resolve(&c.image)?,
                tags: env.resolve_all(&c.tags)?,
                args: env.resolve_values(&c.args)?,
                ..c.clone()
            }),
            Resource::Job(c) => Resource::Job(JobConfig {
                env: env.resolve_all(&c.env)?,
                working_dir: env.resolve_opt(&c.working_dir)?,
                user: env.resolve_opt(&c.user)?,
                net_mode: env.resolve_opt(&c.net_mode)?,
                ..c.clone()
            }),
            Resource::Mount(c) => Resource::Mount(MountConfig {
                bind: c
                    .bind
                    .as_deref()
                    .map(|b| env.resolve(b).map(|b| expand_home(&b)))
                    .transpose()?,
                name: env.resolve_opt(&c.name)?,
                ..c.clone()
            }),
            Resource::Alias(c) => Resource::Alias(c.clone()),
            Resource::Env(c) => Resource::Env(EnvConfig {
                files: env.resolve_all(&c.files)?,
                variables: env.resolve_all(&c.variables)?,
                ..c.clone()
            }),
            Resource::Compose(c) => Resource::Compose(ComposeConfig {
                project: Some(env.resolve(c.project_name())?),
                files: env.resolve_all(&c.files)?,
                ..c.clone()
            }),
            Resource::Volume(c) => Resource::Volume(VolumeConfig {
                path: env.resolve(&c.path)?,
                ..c.clone()
            }),
        };
        Ok(resolved)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Image(c) => fmt::Display::fmt(c, f),
            Resource::Job(c) => fmt::Display::fmt(c, f),
            Resource::Mount(c) => fmt::Display::fmt(c, f),
            Resource::Alias(c) => fmt::Display::fmt(c, f),
            Resource::Env(c) => fmt::Display::fmt(c, f),
            Resource::Compose(c) => fmt::Display::fmt(c, f),
            Resource::Volume(c) => fmt::Display::fmt(c, f),
        }
    }
}

fn validate_job(c: &JobConfig, registry: &Registry) -> anyhow::Result<()> {
    match registry.get(&c.use_image) {
        Some(Resource::Image(_)) => {}
        _ => bail!("use: {} is not an image resource", c.use_image),
    }

    for mount in &c.mounts {
        match registry.get(mount) {
            Some(Resource::Mount(_)) | Some(Resource::Volume(_)) => {}
            _ => bail!("mounts: {mount} is not a mount resource"),
        }
    }

    for (field, patterns) in [("artifact", &c.artifact), ("sources", &c.sources)] {
        for pattern in patterns {
            Glob::new(pattern).map_err(|e| anyhow!("{field}: invalid pattern {pattern:?}: {e}"))?;
        }
    }

    for device in &c.devices {
        ensure!(!device.host.is_empty(), "devices: host must not be empty");
        if let Some(permissions) = device.permissions.as_deref() {
            ensure!(
                permissions.chars().all(|p| matches!(p, 'r' | 'w' | 'm')),
                "devices: {permissions:?} for {} must only use r, w and m",
                device.host
            );
        }
    }

    if c.command.as_deref().is_some_and(|s| !s.is_empty()) && c.command_args().is_none() {
        bail!("command: {:?} is not a valid shell quoted string", c.command);
    }
    if c.entrypoint.as_deref().is_some_and(|s| !s.is_empty()) && c.entrypoint_args().is_none() {
        bail!("entrypoint: {:?} is not a valid shell quoted string", c.entrypoint);
    }

    Ok(())
}

/// Expand a leading `~` to the home directory and drop trailing separators.
fn expand_home(path: &str) -> String {
    let expanded = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => {
            match dirs::home_dir() {
                Some(home) => join_clean(&home, rest),
                None => PathBuf::from(path),
            }
        }
        _ => PathBuf::from(path),
    };
    let s = expanded.to_string_lossy().into_owned();
    let trimmed = s.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() { s } else { trimmed.to_string() }
}

fn join_clean(base: &Path, rest: &str) -> PathBuf {
    let rest = rest.trim_start_matches(['/', '\\']);
    if rest.is_empty() { base.to_path_buf() } else { base.join(rest) }
}
