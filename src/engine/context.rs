// src/engine/context.rs

//! Per-run mutable state shared by the engine and the tasks it runs.
//!
//! The context owns:
//! - the set of task names that did work in this run
//! - the latest resolved copy of every resource touched so far
//! - the variable environment templates are resolved against
//! - handles to the container backend and the filesystem
//!
//! It is plain mutable state: the engine lends it to one task at a time.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use crate::config::resolve::ExecEnv;
use crate::config::resource::Resource;
use crate::exec::ContainerBackend;
use crate::fs::FileSystem;
use crate::task::Name;

/// Immutable options for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Reduce output: task starts are logged at debug level.
    pub quiet: bool,
    /// Bind mount host directories into containers. When false, mounted
    /// directories are copied in and writable ones copied back out.
    pub bind_mount: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quiet: false,
            bind_mount: true,
        }
    }
}

#[derive(Debug)]
pub struct ExecutionContext {
    modified: HashSet<Name>,
    resources: HashMap<String, Resource>,
    env: ExecEnv,
    backend: Arc<dyn ContainerBackend>,
    fs: Arc<dyn FileSystem>,
    settings: Settings,
}

impl ExecutionContext {
    pub fn new(
        env: ExecEnv,
        backend: Arc<dyn ContainerBackend>,
        fs: Arc<dyn FileSystem>,
        settings: Settings,
    ) -> Self {
        Self {
            modified: HashSet::new(),
            resources: HashMap::new(),
            env,
            backend,
            fs,
            settings,
        }
    }

    /// Record that the task `name` did work in this run.
    pub fn set_modified(&mut self, name: &Name) {
        self.modified.insert(name.clone());
    }

    pub fn is_modified(&self, name: &Name) -> bool {
        self.modified.contains(name)
    }

    /// True if any of `names` did work in this run.
    pub fn any_modified(&self, names: &[Name]) -> bool {
        names.iter().any(|name| self.is_modified(name))
    }

    /// Store the latest resolved copy of resource `name`.
    pub fn add_resource(&mut self, name: impl Into<String>, resource: Resource) {
        self.resources.insert(name.into(), resource);
    }

    /// Latest resolved copy of resource `name`, if a task for it has run.
    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    pub fn env(&self) -> &ExecEnv {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut ExecEnv {
        &mut self.env
    }

    pub fn backend(&self) -> Arc<dyn ContainerBackend> {
        Arc::clone(&self.backend)
    }

    pub fn fs(&self) -> Arc<dyn FileSystem> {
        Arc::clone(&self.fs)
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Directory relative paths in resources are resolved against.
    pub fn working_dir(&self) -> &Path {
        self.env.working_dir()
    }
}
