// src/exec/mod.rs

//! Container engine layer.
//!
//! Tasks never start processes themselves; they describe what they need and
//! hand it to a [`ContainerBackend`].
//!
//! - [`backend`] provides the `ContainerBackend` trait and the request types
//!   passed through it.
//! - [`docker`] provides `DockerCli`, the implementation used in production,
//!   which runs the `docker` executable via `tokio::process`.

pub mod backend;
pub mod docker;

pub use backend::{
    BackendFuture, BuildRequest, ComposeCommand, ComposeRequest, ContainerBackend, ContainerSpec,
    CopySpec, MountSpec,
};
pub use docker::DockerCli;
