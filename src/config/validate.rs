// src/config/validate.rs

use std::collections::BTreeMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::config::resource::{Registry, Resource};
use crate::errors::{Result, StevedoreError};
use crate::task::name::{Name, ACTION_SEPARATOR};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::StevedoreError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let meta = raw.meta.clone();
        let registry = build_registry(raw)?;
        validate_config(meta.default.as_deref(), &registry)?;
        Ok(ConfigFile::new_unchecked(meta, registry))
    }
}

/// Run every semantic check on an already merged registry.
pub fn validate_config(default: Option<&str>, registry: &Registry) -> Result<()> {
    ensure_has_resources(registry)?;
    validate_default(default)?;
    validate_resources(registry)?;
    Ok(())
}

/// Merge the per-kind sections into one registry, rejecting names that are
/// declared twice or are not usable in a task identifier.
pub fn build_registry(raw: RawConfigFile) -> Result<Registry> {
    let mut registry: Registry = BTreeMap::new();

    let sections = raw
        .image
        .into_iter()
        .map(|(n, c)| (n, Resource::Image(c)))
        .chain(raw.job.into_iter().map(|(n, c)| (n, Resource::Job(c))))
        .chain(raw.mount.into_iter().map(|(n, c)| (n, Resource::Mount(c))))
        .chain(raw.alias.into_iter().map(|(n, c)| (n, Resource::Alias(c))))
        .chain(raw.env.into_iter().map(|(n, c)| (n, Resource::Env(c))))
        .chain(raw.compose.into_iter().map(|(n, c)| (n, Resource::Compose(c))))
        .chain(raw.volume.into_iter().map(|(n, c)| (n, Resource::Volume(c))));

    for (name, resource) in sections {
        if name.is_empty() || name.contains(ACTION_SEPARATOR) {
            return Err(StevedoreError::ConfigError(format!(
                "invalid resource name {name:?}: names must be non-empty and must not contain '{ACTION_SEPARATOR}'"
            )));
        }
        if let Some(existing) = registry.get(&name) {
            return Err(StevedoreError::ConfigError(format!(
                "resource '{}' is defined as both {} and {}",
                name,
                existing.kind(),
                resource.kind()
            )));
        }
        registry.insert(name, resource);
    }

    Ok(registry)
}

fn ensure_has_resources(registry: &Registry) -> Result<()> {
    if registry.is_empty() {
        return Err(StevedoreError::ConfigError(
            "config must declare at least one resource".to_string(),
        ));
    }
    Ok(())
}

fn validate_default(default: Option<&str>) -> Result<()> {
    if let Some(default) = default.filter(|d| !d.is_empty()) {
        Name::parse(default).map_err(|e| {
            StevedoreError::ConfigError(format!("[meta].default: {e}"))
        })?;
    }
    Ok(())
}

fn validate_resources(registry: &Registry) -> Result<()> {
    for (name, resource) in registry.iter() {
        resource.validate(registry).map_err(|e| {
            StevedoreError::ConfigError(format!("{} '{}': {:#}", resource.kind(), name, e))
        })?;
    }
    Ok(())
}
