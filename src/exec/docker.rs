// src/exec/docker.rs

//! `ContainerBackend` implemented by shelling out to the `docker` CLI.

use std::process::{ExitStatus, Output, Stdio};
use std::time::SystemTime;

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use tokio::process::Command;
use tracing::{debug, info};

use super::backend::{
    BackendFuture, BuildRequest, ComposeCommand, ComposeRequest, ContainerBackend,
    ContainerSpec, MountSpec,
};

/// Real backend used in production.
///
/// Interactive commands (`run`, `build`, `compose`) inherit stdio so their
/// output reaches the user directly; queries capture output instead.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerCli {
    pub fn new() -> Self {
        Self::with_program("docker")
    }

    /// Use a different executable, e.g. `podman`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn status(&self, args: &[String]) -> Result<ExitStatus> {
        debug!(program = %self.program, args = %args.join(" "), "invoking container engine");
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .with_context(|| format!("running {} {}", self.program, args.join(" ")))
    }

    async fn output(&self, args: &[String]) -> Result<Output> {
        debug!(program = %self.program, args = %args.join(" "), "querying container engine");
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("running {} {}", self.program, args.join(" ")))
    }

    async fn check(&self, args: &[String]) -> Result<()> {
        let status = self.status(args).await?;
        if !status.success() {
            bail!(
                "{} {} exited with code {}",
                self.program,
                args.first().map(String::as_str).unwrap_or_default(),
                exit_code(status)
            );
        }
        Ok(())
    }

    /// Run a query whose failure means "not found" when stderr says so.
    async fn found(&self, args: &[String], not_found: &str) -> Result<bool> {
        let output = self.output(args).await?;
        if output.status.success() {
            return Ok(true);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.to_lowercase().contains(&not_found.to_lowercase()) {
            return Ok(false);
        }
        bail!(
            "{} {} failed: {}",
            self.program,
            args.join(" "),
            stderr.trim()
        );
    }
}

impl ContainerBackend for DockerCli {
    fn image_created<'a>(&'a self, image: &'a str) -> BackendFuture<'a, Option<SystemTime>> {
        Box::pin(async move {
            let output = self
                .output(&strings(["image", "inspect", "--format", "{{.Created}}", image]))
                .await?;
            if !output.status.success() {
                return Ok(None);
            }
            let text = String::from_utf8_lossy(&output.stdout);
            let created = DateTime::parse_from_rfc3339(text.trim())
                .with_context(|| format!("parsing creation time {:?} of image {image}", text.trim()))?;
            Ok(Some(SystemTime::from(created)))
        })
    }

    fn build_image<'a>(&'a self, request: &'a BuildRequest) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            info!(tags = ?request.tags, context = %request.context.display(), "building image");
            self.check(&build_args(request)).await
        })
    }

    fn pull_image<'a>(&'a self, image: &'a str) -> BackendFuture<'a, ()> {
        Box::pin(async move { self.check(&strings(["pull", image])).await })
    }

    fn push_image<'a>(&'a self, image: &'a str) -> BackendFuture<'a, ()> {
        Box::pin(async move { self.check(&strings(["push", image])).await })
    }

    fn tag_image<'a>(&'a self, source: &'a str, target: &'a str) -> BackendFuture<'a, ()> {
        Box::pin(async move { self.check(&strings(["tag", source, target])).await })
    }

    fn remove_image<'a>(&'a self, image: &'a str) -> BackendFuture<'a, bool> {
        Box::pin(async move { self.found(&strings(["image", "rm", image]), "No such image").await })
    }

    fn run_container<'a>(&'a self, spec: &'a ContainerSpec) -> BackendFuture<'a, i64> {
        Box::pin(async move {
            if spec.copy_in.is_empty() && spec.copy_out.is_empty() {
                let status = self.status(&run_args(spec)).await?;
                return Ok(exit_code(status));
            }

            self.check(&create_args(spec)).await?;
            for copy in &spec.copy_in {
                let host = copy.host.to_string_lossy();
                let target = format!("{}:{}", spec.name, copy.container);
                self.check(&strings(["cp", &*host, target.as_str()]))
                    .await?;
            }

            let status = self
                .status(&strings(["start", "--attach", spec.name.as_str()]))
                .await?;

            for copy in &spec.copy_out {
                let source = format!("{}:{}", spec.name, copy.container);
                let host = copy.host.to_string_lossy();
                self.check(&strings(["cp", source.as_str(), &*host]))
                    .await?;
            }
            Ok(exit_code(status))
        })
    }

    fn remove_container<'a>(&'a self, name: &'a str) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            // `rm --force` succeeds for missing containers on newer engines.
            if !self.output(&strings(["container", "inspect", name])).await?.status.success() {
                return Ok(false);
            }
            self.check(&strings(["rm", "--force", "--volumes", name])).await?;
            Ok(true)
        })
    }

    fn ensure_volume<'a>(&'a self, name: &'a str) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            if self.output(&strings(["volume", "inspect", name])).await?.status.success() {
                return Ok(false);
            }
            self.check(&strings(["volume", "create", name])).await?;
            Ok(true)
        })
    }

    fn remove_volume<'a>(&'a self, name: &'a str) -> BackendFuture<'a, bool> {
        Box::pin(async move { self.found(&strings(["volume", "rm", name]), "no such volume").await })
    }

    fn compose<'a>(&'a self, request: &'a ComposeRequest) -> BackendFuture<'a, ()> {
        Box::pin(async move { self.check(&compose_args(request)).await })
    }
}

fn strings<const N: usize>(args: [&str; N]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

fn exit_code(status: ExitStatus) -> i64 {
    status.code().map(i64::from).unwrap_or(-1)
}

/// Arguments for `docker build`.
pub fn build_args(request: &BuildRequest) -> Vec<String> {
    let mut args = vec!["build".to_string()];
    for tag in &request.tags {
        args.push("--tag".to_string());
        args.push(tag.clone());
    }
    if let Some(dockerfile) = &request.dockerfile {
        args.push("--file".to_string());
        args.push(dockerfile.to_string_lossy().into_owned());
    }
    for (key, value) in &request.args {
        args.push("--build-arg".to_string());
        args.push(format!("{key}={value}"));
    }
    args.push(request.context.to_string_lossy().into_owned());
    args
}

/// Arguments for `docker run` (attached, container kept for removal).
pub fn run_args(spec: &ContainerSpec) -> Vec<String> {
    container_args("run", spec)
}

/// Arguments for `docker create`, used when files are copied instead of
/// bind mounted.
pub fn create_args(spec: &ContainerSpec) -> Vec<String> {
    container_args("create", spec)
}

fn container_args(verb: &str, spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec![verb.to_string(), "--name".to_string(), spec.name.clone()];

    if spec.interactive {
        args.push("--interactive".to_string());
        args.push("--tty".to_string());
    }
    if spec.privileged {
        args.push("--privileged".to_string());
    }
    for env in &spec.env {
        args.push("--env".to_string());
        args.push(env.clone());
    }
    for mount in &spec.mounts {
        args.push("--volume".to_string());
        args.push(volume_arg(mount));
    }
    for port in &spec.ports {
        args.push("--publish".to_string());
        args.push(port.clone());
    }
    for device in &spec.devices {
        args.push("--device".to_string());
        args.push(device.clone());
    }
    for (key, value) in &spec.labels {
        args.push("--label".to_string());
        args.push(format!("{key}={value}"));
    }
    if let Some(dir) = &spec.working_dir {
        args.push("--workdir".to_string());
        args.push(dir.clone());
    }
    if let Some(user) = &spec.user {
        args.push("--user".to_string());
        args.push(user.clone());
    }
    if let Some(net) = &spec.net_mode {
        args.push("--network".to_string());
        args.push(net.clone());
    }
    // `--entrypoint` takes a single executable; extra words go before the command.
    let mut trailing = Vec::new();
    if let Some(entrypoint) = &spec.entrypoint {
        if let Some((first, rest)) = entrypoint.split_first() {
            args.push("--entrypoint".to_string());
            args.push(first.clone());
            trailing.extend(rest.iter().cloned());
        }
    }

    args.push(spec.image.clone());
    args.extend(trailing);
    if let Some(command) = &spec.command {
        args.extend(command.iter().cloned());
    }
    args
}

fn volume_arg(mount: &MountSpec) -> String {
    let (source, container, read_only) = match mount {
        MountSpec::Bind { host, container, read_only } => {
            (host.to_string_lossy().into_owned(), container, *read_only)
        }
        MountSpec::Volume { name, container, read_only } => (name.clone(), container, *read_only),
    };
    let mode = if read_only { "ro" } else { "rw" };
    format!("{source}:{container}:{mode}")
}

/// Arguments for `docker compose`.
pub fn compose_args(request: &ComposeRequest) -> Vec<String> {
    let mut args = vec![
        "compose".to_string(),
        "--project-name".to_string(),
        request.project.clone(),
    ];
    for file in &request.files {
        args.push("--file".to_string());
        args.push(file.to_string_lossy().into_owned());
    }
    match request.command {
        ComposeCommand::Up { detach: true } => {
            args.push("up".to_string());
            args.push("--detach".to_string());
        }
        ComposeCommand::Up { detach: false } => args.push("up".to_string()),
        ComposeCommand::Down => args.push("down".to_string()),
    }
    args
}
