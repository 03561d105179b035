// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Every error raised while running tasks carries the identifier of the task
//! it belongs to. Collection-time errors (`InvalidName`, `UnknownResource`,
//! `UnknownAction`, `CyclicDependency`) are raised before any task runs.

use thiserror::Error;

use crate::config::resolve::ResolveError;
use crate::config::resource::ResourceKind;
use crate::task::Name;

#[derive(Error, Debug)]
pub enum StevedoreError {
    #[error("invalid task name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("resource {0:?} does not exist")]
    UnknownResource(String),

    #[error("{kind} resource {resource:?} has no action {action:?}")]
    UnknownAction {
        resource: String,
        kind: ResourceKind,
        action: String,
    },

    #[error("invalid dependency cycle: {}", join_names(.path))]
    CyclicDependency { path: Vec<Name> },

    #[error("failed to resolve variables for task \"{task}\": {error}")]
    Resolution { task: Name, error: ResolveError },

    #[error("failed to execute task \"{task}\": {error:#}")]
    Run { task: Name, error: anyhow::Error },

    /// Cleanup failure; reported as a warning, never returned from a run.
    #[error("failed to stop task \"{task}\": {error:#}")]
    Stop { task: Name, error: anyhow::Error },

    #[error("no task to run, and no default task defined")]
    NoDefaultTask,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StevedoreError {
    /// The task this error belongs to, if it was raised while running one.
    pub fn task(&self) -> Option<&Name> {
        match self {
            StevedoreError::Resolution { task, .. }
            | StevedoreError::Run { task, .. }
            | StevedoreError::Stop { task, .. } => Some(task),
            _ => None,
        }
    }
}

fn join_names(names: &[Name]) -> String {
    names
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, StevedoreError>;
