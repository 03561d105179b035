// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod task;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::config::resolve::ExecEnv;
use crate::dag::{collect_tasks, to_dot, TaskCollection};
use crate::engine::{execute_tasks, ExecutionContext, Reporter, RunSummary, Settings, TracingReporter};
use crate::errors::StevedoreError;
use crate::exec::DockerCli;
use crate::fs::RealFileSystem;

/// The tasks to run: `requested` if any, otherwise the configured default.
pub fn requested_tasks(cfg: &ConfigFile, requested: &[String]) -> errors::Result<Vec<String>> {
    if !requested.is_empty() {
        return Ok(requested.to_vec());
    }
    match cfg.default_task() {
        Some(default) => Ok(vec![default.to_string()]),
        None => Err(StevedoreError::NoDefaultTask),
    }
}

/// Collect `requested` against `cfg` and execute the tasks in `ctx`.
///
/// Nothing runs if collection fails.
pub async fn run_tasks<S: AsRef<str>>(
    cfg: &ConfigFile,
    requested: &[S],
    ctx: &mut ExecutionContext,
    reporter: &dyn Reporter,
) -> errors::Result<RunSummary> {
    let tasks = collect_tasks(requested, cfg)?;
    execute_tasks(ctx, &tasks, reporter).await
}

/// Variable environment for a run of `cfg`, seeded from the process
/// environment.
pub fn exec_env(cfg: &ConfigFile) -> errors::Result<ExecEnv> {
    ExecEnv::from_config(cfg)
        .map_err(|e| StevedoreError::ConfigError(format!("meta.exec_id: {e}")))
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - task collection
/// - the execution context (docker CLI backend, real filesystem)
/// - the executor
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.list {
        println!("{}", format_resources(&cfg, &args.tags));
        return Ok(());
    }

    let requested = requested_tasks(&cfg, &args.tasks)?;

    if args.dry_run || args.graph {
        let tasks = collect_tasks(&requested, &cfg)?;
        if args.graph {
            print!("{}", to_dot(&tasks));
        } else {
            print_dry_run(&tasks);
        }
        return Ok(());
    }

    let settings = Settings {
        quiet: args.quiet,
        bind_mount: !args.no_bind_mount,
    };
    let mut ctx = ExecutionContext::new(
        exec_env(&cfg)?,
        Arc::new(DockerCli::new()),
        Arc::new(RealFileSystem),
        settings,
    );
    let reporter = TracingReporter::new(settings.quiet);

    let summary = run_tasks(&cfg, &requested, &mut ctx, &reporter).await?;
    let modified = summary.modified().count();
    info!(
        tasks = summary.outcomes.len(),
        modified,
        "run complete"
    );
    Ok(())
}

/// The `--list` listing: one line per resource with its description (or a
/// summary when it has none) and tags. With `tags`, only resources carrying
/// at least one of them are listed.
pub fn format_resources(cfg: &ConfigFile, tags: &[String]) -> String {
    let mut lines = vec!["resources:".to_string()];
    for (name, resource) in cfg.resources() {
        let annotations = resource.annotations();
        if !tags.is_empty() && !tags.iter().any(|t| annotations.has_tag(t)) {
            continue;
        }
        let about = match annotations.description() {
            Some(description) => description.to_string(),
            None => resource.to_string(),
        };
        let mut line = format!("  {name:<24} {:<8} {about}", resource.kind().as_str());
        if !annotations.tags.is_empty() {
            line.push_str(&format!(" [{}]", annotations.tags.join(", ")));
        }
        lines.push(line);
    }
    if let Some(default) = cfg.default_task() {
        lines.push(String::new());
        lines.push(format!("default: {default}"));
    }
    lines.join("\n")
}

/// Print the tasks in run order, one per line, with their summary.
fn print_dry_run(tasks: &TaskCollection) {
    println!("stevedore dry-run ({} tasks):", tasks.len());
    for task in tasks {
        println!("  - {task}");
        if !task.dependencies().is_empty() {
            let deps: Vec<String> = task.dependencies().iter().map(|d| d.to_string()).collect();
            println!("      depends: {}", deps.join(", "));
        }
    }
    debug!("dry-run complete (no execution)");
}
