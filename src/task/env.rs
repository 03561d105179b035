// src/task/env.rs

//! Tasks for `env` resources: load variables into the run's variable
//! environment so later resources can refer to them as `{env.NAME}`.

use anyhow::{bail, Context};
use tracing::debug;

use crate::config::model::EnvConfig;
use crate::config::resource::{Resource, ResourceKind};
use crate::engine::context::ExecutionContext;
use crate::task::factory::mismatched;
use crate::task::name::Name;
use crate::task::{Task, TaskFuture};

#[derive(Debug)]
pub struct EnvTask {
    name: Name,
    config: EnvConfig,
    remove: bool,
}

fn construct(name: Name, resource: Resource, remove: bool) -> Box<dyn Task> {
    match resource {
        Resource::Env(config) => Box::new(EnvTask {
            name,
            config,
            remove,
        }),
        other => mismatched(&name, ResourceKind::Env, &other),
    }
}

pub fn set(name: Name, resource: Resource) -> Box<dyn Task> {
    construct(name, resource, false)
}

pub fn remove(name: Name, resource: Resource) -> Box<dyn Task> {
    construct(name, resource, true)
}

/// Parse `KEY=VALUE` lines, skipping blank lines and `#` comments.
pub fn parse_env_lines(content: &str) -> anyhow::Result<Vec<(String, String)>> {
    let mut vars = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        vars.push(split_var(line).with_context(|| format!("line {}", index + 1))?);
    }
    Ok(vars)
}

fn split_var(value: &str) -> anyhow::Result<(String, String)> {
    match value.split_once('=') {
        Some((key, val)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), val.to_string()))
        }
        _ => bail!("{value:?} is not of the form KEY=VALUE"),
    }
}

impl EnvTask {
    fn set(&self, ctx: &mut ExecutionContext) -> anyhow::Result<()> {
        let fs = ctx.fs();
        let mut vars = Vec::new();
        for file in &self.config.files {
            let path = ctx.working_dir().join(file);
            let content = fs.read_to_string(&path)?;
            vars.extend(
                parse_env_lines(&content)
                    .with_context(|| format!("parsing {}", path.display()))?,
            );
        }
        for var in &self.config.variables {
            vars.push(split_var(var)?);
        }

        for (key, value) in vars {
            debug!(task = %self.name, variable = %key, "setting variable");
            ctx.env_mut().set_var(key, value);
        }
        Ok(())
    }
}

impl Task for EnvTask {
    fn name(&self) -> &Name {
        &self.name
    }

    fn run<'a>(
        &'a mut self,
        ctx: &'a mut ExecutionContext,
        _deps_modified: bool,
    ) -> TaskFuture<'a, bool> {
        Box::pin(async move {
            if !self.remove {
                self.set(ctx)?;
            }
            Ok(false)
        })
    }
}
