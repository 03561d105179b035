// src/config/resolve.rs

//! Variable substitution for resource fields.
//!
//! Templates use `{...}` placeholders:
//!
//! - `{env.NAME}` / `{env.NAME:default}`: a variable from the environment
//!   (the process environment, extended at run time by `env` tasks)
//! - `{project}`: the project name from `[meta]`
//! - `{exec-id}`: the execution id from `[meta].exec_id`
//! - `{work-dir}`: the directory containing the config file
//! - `{user.name}`: the current user (`USER` or `USERNAME`)
//!
//! `{{` and `}}` produce literal braces.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::config::model::ConfigFile;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|[{}]").expect("placeholder pattern is valid")
});

/// Default template for `[meta].exec_id`.
pub const DEFAULT_EXEC_ID: &str = "{user.name}";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unknown variable {{{0}}}")]
    UnknownVariable(String),

    #[error("environment variable {0:?} is not set and has no default")]
    UnsetEnv(String),

    #[error("unbalanced brace in {0:?}")]
    UnbalancedBrace(String),
}

/// The variable environment templates are resolved against.
#[derive(Debug, Clone)]
pub struct ExecEnv {
    project: String,
    exec_id: String,
    working_dir: PathBuf,
    vars: BTreeMap<String, String>,
}

impl ExecEnv {
    pub fn new(
        project: impl Into<String>,
        working_dir: impl Into<PathBuf>,
        vars: BTreeMap<String, String>,
    ) -> Self {
        Self {
            project: project.into(),
            exec_id: String::new(),
            working_dir: working_dir.into(),
            vars,
        }
    }

    /// Build the environment for a run of `cfg`, seeded from the process
    /// environment, and resolve the configured execution id against it.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self, ResolveError> {
        let env = Self::new(cfg.project(), cfg.working_dir(), std::env::vars().collect());
        let template = cfg.meta.exec_id.as_deref().unwrap_or(DEFAULT_EXEC_ID);
        let exec_id = env.resolve(template)?;
        Ok(env.with_exec_id(exec_id))
    }

    pub fn with_exec_id(mut self, exec_id: impl Into<String>) -> Self {
        self.exec_id = exec_id.into();
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn exec_id(&self) -> &str {
        &self.exec_id
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// All variables whose name starts with `prefix`.
    pub fn vars_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.vars
            .iter()
            .filter(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Substitute every placeholder in `template`.
    pub fn resolve(&self, template: &str) -> Result<String, ResolveError> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&template[last..whole.start()]);
            last = whole.end();

            match (whole.as_str(), caps.get(1)) {
                ("{{", _) => out.push('{'),
                ("}}", _) => out.push('}'),
                (_, Some(inner)) => out.push_str(&self.lookup(inner.as_str().trim())?),
                _ => return Err(ResolveError::UnbalancedBrace(template.to_string())),
            }
        }

        out.push_str(&template[last..]);
        Ok(out)
    }

    pub fn resolve_all(&self, values: &[String]) -> Result<Vec<String>, ResolveError> {
        values.iter().map(|v| self.resolve(v)).collect()
    }

    pub fn resolve_opt(&self, value: &Option<String>) -> Result<Option<String>, ResolveError> {
        value.as_deref().map(|v| self.resolve(v)).transpose()
    }

    pub fn resolve_values(
        &self,
        values: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, ResolveError> {
        values
            .iter()
            .map(|(k, v)| Ok((k.clone(), self.resolve(v)?)))
            .collect()
    }

    fn lookup(&self, variable: &str) -> Result<String, ResolveError> {
        match variable {
            "project" => Ok(self.project.clone()),
            "exec-id" => Ok(self.exec_id.clone()),
            "work-dir" => Ok(self.working_dir.display().to_string()),
            "user.name" => self
                .var("USER")
                .or_else(|| self.var("USERNAME"))
                .map(str::to_string)
                .ok_or_else(|| ResolveError::UnsetEnv("USER".to_string())),
            other => match other.strip_prefix("env.") {
                Some(spec) => {
                    let (name, default) = match spec.split_once(':') {
                        Some((name, default)) => (name, Some(default)),
                        None => (spec, None),
                    };
                    self.var(name)
                        .or(default)
                        .map(str::to_string)
                        .ok_or_else(|| ResolveError::UnsetEnv(name.to_string()))
                }
                None => Err(ResolveError::UnknownVariable(other.to_string())),
            },
        }
    }
}
