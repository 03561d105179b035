// src/task/factory.rs

//! Lookup table from `(resource kind, action)` to the action's dependencies
//! and task constructor.
//!
//! The first action listed for a kind is its default. `rm` is accepted as an
//! alias for `remove`.

use crate::config::model::ConfigFile;
use crate::config::resource::{Resource, ResourceKind};
use crate::errors::{Result, StevedoreError};
use crate::task::name::Name;
use crate::task::{alias, compose, env, image, job, mount, volume, Task, TaskConfig};

/// Dependencies of one action of one resource.
pub type DependencyFn = fn(&Name, &Resource) -> Result<Vec<Name>>;

/// Builds the runtime task for one action of one resource.
pub type ConstructorFn = fn(Name, Resource) -> Box<dyn Task>;

/// One row of an action table.
#[derive(Debug, Clone, Copy)]
pub struct ActionSpec {
    pub name: &'static str,
    pub dependencies: DependencyFn,
    pub constructor: ConstructorFn,
}

const fn action(
    name: &'static str,
    dependencies: DependencyFn,
    constructor: ConstructorFn,
) -> ActionSpec {
    ActionSpec {
        name,
        dependencies,
        constructor,
    }
}

const IMAGE_ACTIONS: &[ActionSpec] = &[
    action("build", declared, image::build),
    action("pull", none, image::pull),
    action("push", image_build, image::push),
    action("tag", image_build, image::tag),
    action("remove", none, image::remove),
];

const JOB_ACTIONS: &[ActionSpec] = &[
    action("run", declared, job::run),
    action("remove", none, job::remove),
];

const MOUNT_ACTIONS: &[ActionSpec] = &[
    action("create", declared, mount::create),
    action("remove", none, mount::remove),
];

const ALIAS_ACTIONS: &[ActionSpec] = &[
    action("run", declared, alias::run),
    action("remove", alias_remove, alias::remove),
];

const ENV_ACTIONS: &[ActionSpec] = &[
    action("set", declared, env::set),
    action("remove", none, env::remove),
];

const COMPOSE_ACTIONS: &[ActionSpec] = &[
    action("up", declared, compose::up),
    action("attach", declared, compose::attach),
    action("detach", declared, compose::detach),
    action("down", none, compose::down),
    action("remove", none, compose::down),
];

const VOLUME_ACTIONS: &[ActionSpec] = &[
    action("create", declared, volume::create),
    action("remove", none, volume::remove),
];

/// Every action supported by `kind`, default first.
pub fn actions(kind: ResourceKind) -> &'static [ActionSpec] {
    match kind {
        ResourceKind::Image => IMAGE_ACTIONS,
        ResourceKind::Job => JOB_ACTIONS,
        ResourceKind::Mount => MOUNT_ACTIONS,
        ResourceKind::Alias => ALIAS_ACTIONS,
        ResourceKind::Env => ENV_ACTIONS,
        ResourceKind::Compose => COMPOSE_ACTIONS,
        ResourceKind::Volume => VOLUME_ACTIONS,
    }
}

pub fn default_action(kind: ResourceKind) -> &'static str {
    actions(kind)[0].name
}

/// Map accepted spellings to the canonical action name.
pub fn canonical_action(action: &str) -> &str {
    match action {
        "rm" => "remove",
        other => other,
    }
}

/// Find the table row for `action`, or the default when `None`.
pub fn action_spec(kind: ResourceKind, action: Option<&str>) -> Option<&'static ActionSpec> {
    let table = actions(kind);
    match action {
        None => table.first(),
        Some(action) => {
            let action = canonical_action(action);
            table.iter().find(|spec| spec.name == action)
        }
    }
}

fn lookup(name: &Name, resource: &Resource) -> Result<&'static ActionSpec> {
    action_spec(resource.kind(), name.action()).ok_or_else(|| StevedoreError::UnknownAction {
        resource: name.resource().to_string(),
        kind: resource.kind(),
        action: name.action().unwrap_or_default().to_string(),
    })
}

/// Bind `name` to a concrete action of `resource`'s kind.
pub fn canonical_name(name: &Name, resource: &Resource) -> Result<Name> {
    let spec = lookup(name, resource)?;
    Ok(name.with_action(spec.name))
}

/// Build the [`TaskConfig`] for `name`.
///
/// Dependency names are bound to their canonical actions where the
/// dependency exists, so they compare equal to the names the collector
/// marks as modified. Missing dependencies are left as written and reported
/// by the collector when it reaches them.
pub fn task_config(name: &Name, resource: &Resource, cfg: &ConfigFile) -> Result<TaskConfig> {
    let spec = lookup(name, resource)?;
    let name = name.with_action(spec.name);

    let dependencies = (spec.dependencies)(&name, resource)?
        .into_iter()
        .map(|dep| match cfg.resource(dep.resource()) {
            Some(target) => canonical_name(&dep, target).unwrap_or(dep),
            None => dep,
        })
        .collect();

    Ok(TaskConfig::new(name, resource.clone(), dependencies, spec.constructor))
}

/// Panic for a constructor handed a resource of another kind.
///
/// The factory only pairs constructors with their own kind, so reaching this
/// is a bug.
pub(crate) fn mismatched(name: &Name, expected: ResourceKind, got: &Resource) -> ! {
    panic!(
        "task {name}: expected a {expected} resource, got a {} resource",
        got.kind()
    )
}

fn declared(_: &Name, resource: &Resource) -> Result<Vec<Name>> {
    resource.dependencies()
}

fn none(_: &Name, _: &Resource) -> Result<Vec<Name>> {
    Ok(Vec::new())
}

fn image_build(name: &Name, _: &Resource) -> Result<Vec<Name>> {
    Ok(vec![name.with_action("build")])
}

/// Removing an alias removes everything it lists, last first.
fn alias_remove(_: &Name, resource: &Resource) -> Result<Vec<Name>> {
    let mut deps: Vec<Name> = resource
        .dependencies()?
        .iter()
        .map(|dep| dep.with_action("remove"))
        .collect();
    deps.reverse();
    Ok(deps)
}
