// src/config/mod.rs

//! Configuration loading, validation and variable resolution.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Define the closed set of resource kinds (`resource.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate names and cross-resource references (`validate.rs`).
//! - Substitute `{...}` variables in resource fields (`resolve.rs`).

pub mod loader;
pub mod model;
pub mod resolve;
pub mod resource;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    AliasConfig, Annotations, ComposeConfig, ConfigFile, Device, EnvConfig, ImageConfig,
    JobConfig, MetaSection, MountConfig, RawConfigFile, VolumeConfig,
};
pub use resolve::{ExecEnv, ResolveError};
pub use resource::{Registry, Resource, ResourceKind};
pub use validate::{build_registry, validate_config};
