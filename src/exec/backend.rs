// src/exec/backend.rs

//! Pluggable container engine abstraction.
//!
//! Tasks talk to a `ContainerBackend` instead of invoking the engine
//! directly. This makes it easy to swap in a fake backend in tests while
//! keeping the production implementation in [`super::docker`].

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::SystemTime;

use anyhow::Result;

/// Boxed future returned by backend operations.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Everything needed to build one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub context: PathBuf,
    pub dockerfile: Option<PathBuf>,
    /// Full `image:tag` references to apply.
    pub tags: Vec<String>,
    pub args: BTreeMap<String, String>,
}

/// A filesystem attached to a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountSpec {
    Bind {
        host: PathBuf,
        container: String,
        read_only: bool,
    },
    Volume {
        name: String,
        container: String,
        read_only: bool,
    },
}

/// A host path copied into a container before start, or out after exit.
///
/// Used instead of bind mounts when bind mounting is disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopySpec {
    pub host: PathBuf,
    pub container: String,
}

/// Description of a container to run to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub command: Option<Vec<String>>,
    pub entrypoint: Option<Vec<String>>,
    pub env: Vec<String>,
    pub mounts: Vec<MountSpec>,
    pub copy_in: Vec<CopySpec>,
    pub copy_out: Vec<CopySpec>,
    pub working_dir: Option<String>,
    pub user: Option<String>,
    pub net_mode: Option<String>,
    pub ports: Vec<String>,
    /// `host:container[:permissions]` device mappings.
    pub devices: Vec<String>,
    pub privileged: bool,
    pub interactive: bool,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeCommand {
    Up { detach: bool },
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeRequest {
    pub project: String,
    pub files: Vec<PathBuf>,
    pub command: ComposeCommand,
}

/// Trait abstracting the container engine.
///
/// Production code uses [`super::DockerCli`]; tests can provide their own
/// implementation that records calls instead of touching an engine.
pub trait ContainerBackend: Send + Sync + fmt::Debug {
    /// Creation time of a local image, `None` if it does not exist.
    fn image_created<'a>(&'a self, image: &'a str) -> BackendFuture<'a, Option<SystemTime>>;

    fn build_image<'a>(&'a self, request: &'a BuildRequest) -> BackendFuture<'a, ()>;

    fn pull_image<'a>(&'a self, image: &'a str) -> BackendFuture<'a, ()>;

    fn push_image<'a>(&'a self, image: &'a str) -> BackendFuture<'a, ()>;

    fn tag_image<'a>(&'a self, source: &'a str, target: &'a str) -> BackendFuture<'a, ()>;

    /// Remove a local image. Returns `false` if it did not exist.
    fn remove_image<'a>(&'a self, image: &'a str) -> BackendFuture<'a, bool>;

    /// Run a container to completion and return its exit code.
    ///
    /// The container is left in place; callers remove it with
    /// [`ContainerBackend::remove_container`].
    fn run_container<'a>(&'a self, spec: &'a ContainerSpec) -> BackendFuture<'a, i64>;

    /// Remove a container. Returns `false` if it did not exist.
    fn remove_container<'a>(&'a self, name: &'a str) -> BackendFuture<'a, bool>;

    /// Create a named volume if missing. Returns `true` if it was created.
    fn ensure_volume<'a>(&'a self, name: &'a str) -> BackendFuture<'a, bool>;

    /// Remove a named volume. Returns `false` if it did not exist.
    fn remove_volume<'a>(&'a self, name: &'a str) -> BackendFuture<'a, bool>;

    fn compose<'a>(&'a self, request: &'a ComposeRequest) -> BackendFuture<'a, ()>;
}
