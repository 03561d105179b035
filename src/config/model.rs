// src/config/model.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::resource::{Registry, Resource};
use crate::types::{MountMode, PullPolicy};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [meta]
/// project = "demo"
/// default = "all"
///
/// [image.builder]
/// image = "demo/builder"
///
/// [mount.source]
/// bind = "."
/// path = "/work"
///
/// [job.compile]
/// use = "builder"
/// mounts = ["source"]
/// command = "make build"
/// artifact = ["dist/app"]
///
/// [alias.all]
/// tasks = ["compile"]
/// ```
///
/// Each section maps resource names to resources of one kind. Names must be
/// unique across sections; [`ConfigFile`] is the validated form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub meta: MetaSection,

    #[serde(default)]
    pub image: BTreeMap<String, ImageConfig>,

    #[serde(default)]
    pub job: BTreeMap<String, JobConfig>,

    #[serde(default)]
    pub mount: BTreeMap<String, MountConfig>,

    #[serde(default)]
    pub alias: BTreeMap<String, AliasConfig>,

    #[serde(default)]
    pub env: BTreeMap<String, EnvConfig>,

    #[serde(default)]
    pub compose: BTreeMap<String, ComposeConfig>,

    #[serde(default)]
    pub volume: BTreeMap<String, VolumeConfig>,
}

/// `[meta]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetaSection {
    /// Project name; defaults to the name of the config file's directory.
    #[serde(default)]
    pub project: Option<String>,

    /// Task to run when none is given on the command line.
    #[serde(default)]
    pub default: Option<String>,

    /// Template for the execution id used to name containers.
    #[serde(default)]
    pub exec_id: Option<String>,
}

/// Validated configuration: the resource registry for one invocation.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub meta: MetaSection,
    working_dir: PathBuf,
    resources: Registry,
}

impl ConfigFile {
    /// Construct without validation. Prefer `ConfigFile::try_from`.
    pub fn new_unchecked(meta: MetaSection, resources: Registry) -> Self {
        Self {
            meta,
            working_dir: PathBuf::from("."),
            resources,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    pub fn resources(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn registry(&self) -> &Registry {
        &self.resources
    }

    pub fn default_task(&self) -> Option<&str> {
        self.meta.default.as_deref().filter(|d| !d.is_empty())
    }

    /// Project name from `[meta]`, falling back to the working directory's
    /// name.
    pub fn project(&self) -> String {
        if let Some(project) = self.meta.project.as_deref().filter(|p| !p.is_empty()) {
            return project.to_string();
        }
        self.working_dir
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "stevedore".to_string())
    }
}

/// Free-form documentation attached to any resource, shown by `--list`.
///
/// ```toml
/// [job.compile.annotations]
/// description = "Compile the release binary"
/// tags = ["build"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Annotations {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl Annotations {
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// `[image.<name>]`: an image built from a Dockerfile, or pulled/pushed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageConfig {
    /// Repository name of the image, without a tag.
    pub image: String,

    /// Build context directory, relative to the config file.
    #[serde(default = "default_context")]
    pub context: String,

    /// Dockerfile path relative to the context.
    #[serde(default)]
    pub dockerfile: Option<String>,

    /// Tags to apply; the first is the canonical one. Defaults to `latest`.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Build arguments. Values support variables.
    #[serde(default)]
    pub args: BTreeMap<String, String>,

    #[serde(default)]
    pub pull: PullPolicy,

    #[serde(default)]
    pub depends: Vec<String>,

    #[serde(default)]
    pub annotations: Annotations,
}

fn default_context() -> String {
    ".".to_string()
}

impl ImageConfig {
    pub fn effective_tags(&self) -> Vec<String> {
        if self.tags.is_empty() {
            vec!["latest".to_string()]
        } else {
            self.tags.clone()
        }
    }

    /// `image:tag` for every configured tag.
    pub fn references(&self) -> Vec<String> {
        self.effective_tags()
            .iter()
            .map(|tag| format!("{}:{}", self.image, tag))
            .collect()
    }

    /// `image:tag` for the canonical (first) tag.
    pub fn reference(&self) -> String {
        let tag = self.tags.first().map(String::as_str).unwrap_or("latest");
        format!("{}:{}", self.image, tag)
    }
}

impl fmt::Display for ImageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dockerfile = self.dockerfile.as_deref().unwrap_or("Dockerfile");
        write!(
            f,
            "Build image '{}' from '{}/{}'",
            self.reference(),
            self.context,
            dockerfile
        )
    }
}

/// `[job.<name>]`: run a command in a container created from an image.
///
/// A job without `artifact` is never up to date. With `artifact`, the job is
/// skipped when every artifact is newer than its sources. Sources default to
/// the `use` image and the files under the job's bind mounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Name of the image resource the container is created from.
    #[serde(rename = "use")]
    pub use_image: String,

    /// Files (or globs) the job creates, relative to the config file.
    #[serde(default)]
    pub artifact: Vec<String>,

    /// Shell-quoted command.
    #[serde(default)]
    pub command: Option<String>,

    /// Shell-quoted entrypoint override.
    #[serde(default)]
    pub entrypoint: Option<String>,

    /// Files (or globs) the artifact is built from.
    #[serde(default)]
    pub sources: Vec<String>,

    /// Names of mount or volume resources to attach.
    #[serde(default)]
    pub mounts: Vec<String>,

    #[serde(default)]
    pub privileged: bool,

    #[serde(default)]
    pub interactive: bool,

    /// `KEY=VALUE` pairs. Supports variables.
    #[serde(default)]
    pub env: Vec<String>,

    /// Expose the container engine to the job.
    #[serde(default)]
    pub provide_docker: bool,

    #[serde(default)]
    pub net_mode: Option<String>,

    #[serde(default)]
    pub working_dir: Option<String>,

    #[serde(default)]
    pub user: Option<String>,

    /// `host_port:container_port` pairs.
    #[serde(default)]
    pub ports: Vec<String>,

    /// Host devices exposed to the container.
    #[serde(default)]
    pub devices: Vec<Device>,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub depends: Vec<String>,

    #[serde(default)]
    pub annotations: Annotations,
}

impl JobConfig {
    /// The command split into arguments, `None` if unset or malformed.
    pub fn command_args(&self) -> Option<Vec<String>> {
        self.command.as_deref().filter(|c| !c.is_empty()).and_then(shlex::split)
    }

    pub fn entrypoint_args(&self) -> Option<Vec<String>> {
        self.entrypoint.as_deref().filter(|c| !c.is_empty()).and_then(shlex::split)
    }
}

impl fmt::Display for JobConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Run ")?;
        if let Some(command) = self.command.as_deref().filter(|c| !c.is_empty()) {
            write!(f, "'{command}' using ")?;
        }
        write!(f, "the '{}' image", self.use_image)?;
        if !self.artifact.is_empty() {
            write!(f, " to create '{}'", self.artifact.join(", "))?;
        }
        Ok(())
    }
}

/// A host device mapped into a job's container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Device {
    pub host: String,

    /// Path inside the container. Defaults to `host`.
    #[serde(default)]
    pub container: Option<String>,

    /// cgroup permissions, any of `r`, `w` and `m`. Defaults to `rwm`.
    #[serde(default)]
    pub permissions: Option<String>,
}

impl Device {
    /// `host:container:permissions` as the engine's `--device` flag takes it.
    pub fn spec(&self) -> String {
        let container = self.container.as_deref().filter(|c| !c.is_empty()).unwrap_or(&self.host);
        match self.permissions.as_deref().filter(|p| !p.is_empty()) {
            Some(permissions) => format!("{}:{}:{}", self.host, container, permissions),
            None => format!("{}:{}", self.host, container),
        }
    }
}

/// `[mount.<name>]`: a host directory or named volume attached to jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MountConfig {
    /// Host path, relative to the config file. `~` expands to the home
    /// directory.
    #[serde(default)]
    pub bind: Option<String>,

    /// Path inside the container.
    pub path: String,

    /// Name of an engine-managed volume (instead of `bind`).
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub read_only: bool,

    #[serde(default)]
    pub annotations: Annotations,
}

impl fmt::Display for MountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.bind, &self.name) {
            (Some(bind), _) => write!(f, "Mount '{}' at '{}'", bind, self.path),
            (None, Some(name)) => write!(f, "Mount volume '{}' at '{}'", name, self.path),
            (None, None) => write!(f, "Mount at '{}'", self.path),
        }
    }
}

/// `[alias.<name>]`: a named group of tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasConfig {
    pub tasks: Vec<String>,

    #[serde(default)]
    pub annotations: Annotations,
}

impl fmt::Display for AliasConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Run tasks: {}", self.tasks.join(", "))
    }
}

/// `[env.<name>]`: variables made available to later tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvConfig {
    /// Files of `KEY=VALUE` lines.
    #[serde(default)]
    pub files: Vec<String>,

    /// `KEY=VALUE` pairs.
    #[serde(default)]
    pub variables: Vec<String>,

    #[serde(default)]
    pub annotations: Annotations,
}

impl fmt::Display for EnvConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Set vars from: {} and set: {}",
            self.files.join(", "),
            self.variables.join(", ")
        )
    }
}

/// `[compose.<name>]`: a Compose project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComposeConfig {
    pub files: Vec<String>,

    /// Compose project name. Defaults to `{project}`.
    #[serde(default)]
    pub project: Option<String>,

    #[serde(default)]
    pub depends: Vec<String>,

    #[serde(default)]
    pub annotations: Annotations,
}

impl ComposeConfig {
    pub fn project_name(&self) -> &str {
        self.project.as_deref().unwrap_or("{project}")
    }
}

impl fmt::Display for ComposeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Run Compose project '{}' from: {}",
            self.project_name(),
            self.files.join(", ")
        )
    }
}

/// `[volume.<name>]`: a host directory created on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumeConfig {
    /// Host path relative to the config file.
    pub path: String,

    /// Path inside containers that mount it.
    pub mount: String,

    #[serde(default)]
    pub mode: MountMode,

    #[serde(default)]
    pub annotations: Annotations,
}

impl fmt::Display for VolumeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Create directory '{}' to be mounted at '{}:{}'",
            self.path, self.mount, self.mode
        )
    }
}
