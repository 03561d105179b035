use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use anyhow::bail;
use stevedore::exec::{
    BackendFuture, BuildRequest, ComposeRequest, ContainerBackend, ContainerSpec,
};

/// One call made against a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    BuildImage(BuildRequest),
    PullImage(String),
    PushImage(String),
    TagImage { source: String, target: String },
    RemoveImage(String),
    RunContainer(ContainerSpec),
    RemoveContainer(String),
    EnsureVolume(String),
    RemoveVolume(String),
    Compose(ComposeRequest),
}

#[derive(Debug)]
struct State {
    calls: Vec<BackendCall>,
    images: HashMap<String, SystemTime>,
    containers: HashSet<String>,
    volumes: HashSet<String>,
    build_time: Option<SystemTime>,
    exit_code: i64,
    failing: HashSet<&'static str>,
}

/// A fake container engine that:
/// - records every mutating call
/// - keeps just enough state (images, containers, volumes) for staleness
///   checks to behave like the real thing.
///
/// Clones share state, so a test can keep a handle after passing one to the
/// execution context.
#[derive(Debug, Clone)]
pub struct RecordingBackend {
    state: Arc<Mutex<State>>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                calls: Vec::new(),
                images: HashMap::new(),
                containers: HashSet::new(),
                volumes: HashSet::new(),
                build_time: None,
                exit_code: 0,
                failing: HashSet::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Pretend `reference` exists locally, created at `created`.
    pub fn with_image(self, reference: &str, created: SystemTime) -> Self {
        self.state().images.insert(reference.to_string(), created);
        self
    }

    /// Creation time recorded for built and pulled images (default: now).
    pub fn with_build_time(self, time: SystemTime) -> Self {
        self.state().build_time = Some(time);
        self
    }

    /// Exit code returned by every container run.
    pub fn with_exit_code(self, code: i64) -> Self {
        self.state().exit_code = code;
        self
    }

    /// Make every call of operation `op` (e.g. `"build_image"`) fail.
    pub fn failing(self, op: &'static str) -> Self {
        self.state().failing.insert(op);
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state().calls.clone()
    }

    pub fn has_image(&self, reference: &str) -> bool {
        self.state().images.contains_key(reference)
    }

    pub fn has_volume(&self, name: &str) -> bool {
        self.state().volumes.contains(name)
    }

    pub fn has_container(&self, name: &str) -> bool {
        self.state().containers.contains(name)
    }

    /// Containers started by `run_container`, in order.
    pub fn runs(&self) -> Vec<ContainerSpec> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BackendCall::RunContainer(spec) => Some(spec),
                _ => None,
            })
            .collect()
    }

    fn record(&self, op: &'static str, call: BackendCall) -> anyhow::Result<()> {
        let mut state = self.state();
        state.calls.push(call);
        if state.failing.contains(op) {
            bail!("{op} failed");
        }
        Ok(())
    }

    fn created_now(&self) -> SystemTime {
        self.state().build_time.unwrap_or_else(SystemTime::now)
    }
}

impl ContainerBackend for RecordingBackend {
    fn image_created<'a>(&'a self, image: &'a str) -> BackendFuture<'a, Option<SystemTime>> {
        Box::pin(async move { Ok(self.state().images.get(image).copied()) })
    }

    fn build_image<'a>(&'a self, request: &'a BuildRequest) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            self.record("build_image", BackendCall::BuildImage(request.clone()))?;
            let created = self.created_now();
            let mut state = self.state();
            for tag in &request.tags {
                state.images.insert(tag.clone(), created);
            }
            Ok(())
        })
    }

    fn pull_image<'a>(&'a self, image: &'a str) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            self.record("pull_image", BackendCall::PullImage(image.to_string()))?;
            let created = self.created_now();
            self.state().images.insert(image.to_string(), created);
            Ok(())
        })
    }

    fn push_image<'a>(&'a self, image: &'a str) -> BackendFuture<'a, ()> {
        Box::pin(async move { self.record("push_image", BackendCall::PushImage(image.to_string())) })
    }

    fn tag_image<'a>(&'a self, source: &'a str, target: &'a str) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            self.record(
                "tag_image",
                BackendCall::TagImage {
                    source: source.to_string(),
                    target: target.to_string(),
                },
            )?;
            let mut state = self.state();
            if let Some(created) = state.images.get(source).copied() {
                state.images.insert(target.to_string(), created);
            }
            Ok(())
        })
    }

    fn remove_image<'a>(&'a self, image: &'a str) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            self.record("remove_image", BackendCall::RemoveImage(image.to_string()))?;
            Ok(self.state().images.remove(image).is_some())
        })
    }

    fn run_container<'a>(&'a self, spec: &'a ContainerSpec) -> BackendFuture<'a, i64> {
        Box::pin(async move {
            self.record("run_container", BackendCall::RunContainer(spec.clone()))?;
            let mut state = self.state();
            state.containers.insert(spec.name.clone());
            Ok(state.exit_code)
        })
    }

    fn remove_container<'a>(&'a self, name: &'a str) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            self.record("remove_container", BackendCall::RemoveContainer(name.to_string()))?;
            Ok(self.state().containers.remove(name))
        })
    }

    fn ensure_volume<'a>(&'a self, name: &'a str) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            self.record("ensure_volume", BackendCall::EnsureVolume(name.to_string()))?;
            Ok(self.state().volumes.insert(name.to_string()))
        })
    }

    fn remove_volume<'a>(&'a self, name: &'a str) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            self.record("remove_volume", BackendCall::RemoveVolume(name.to_string()))?;
            Ok(self.state().volumes.remove(name))
        })
    }

    fn compose<'a>(&'a self, request: &'a ComposeRequest) -> BackendFuture<'a, ()> {
        Box::pin(async move { self.record("compose", BackendCall::Compose(request.clone())) })
    }
}
