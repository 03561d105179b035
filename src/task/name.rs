// src/task/name.rs

//! Task identifiers of the form `resource[:action]`.

use std::fmt;
use std::str::FromStr;

use crate::errors::{Result, StevedoreError};

/// Separator between the resource and the action in a task identifier.
pub const ACTION_SEPARATOR: char = ':';

/// Identifier of one task: a resource name plus an action.
///
/// A name parsed without an action refers to the default action of the
/// resource's kind. The collector binds every name to a concrete action once
/// the resource kind is known, so `db` and `db:up` compare equal after
/// collection but not before.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    resource: String,
    action: Option<String>,
}

impl Name {
    /// Build a name with an explicit action.
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: Some(action.into()),
        }
    }

    /// Build a name that refers to the default action of `resource`.
    pub fn resource_only(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: None,
        }
    }

    /// Parse `resource[:action]`.
    ///
    /// Only the syntax is checked here; whether the resource exists is
    /// decided later against the registry.
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = |reason| StevedoreError::InvalidName {
            name: value.to_string(),
            reason,
        };

        let (resource, action) = match value.split_once(ACTION_SEPARATOR) {
            None => (value, None),
            Some((resource, action)) => {
                if action.contains(ACTION_SEPARATOR) {
                    return Err(invalid("more than one action separator"));
                }
                if action.is_empty() {
                    return Err(invalid("action is empty"));
                }
                (resource, Some(action))
            }
        };

        if resource.is_empty() {
            return Err(invalid("resource name is empty"));
        }

        Ok(Self {
            resource: resource.to_string(),
            action: action.map(str::to_string),
        })
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The action, or `None` while the name still refers to the default.
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn has_action(&self, action: &str) -> bool {
        self.action.as_deref() == Some(action)
    }

    /// Same resource, bound to `action`.
    pub fn with_action(&self, action: impl Into<String>) -> Self {
        Self::new(self.resource.clone(), action)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.action {
            Some(action) => write!(f, "{}{}{}", self.resource, ACTION_SEPARATOR, action),
            None => f.write_str(&self.resource),
        }
    }
}

impl FromStr for Name {
    type Err = StevedoreError;

    fn from_str(s: &str) -> Result<Self> {
        Name::parse(s)
    }
}

/// Parse every identifier in `values`, failing on the first malformed one.
pub fn parse_names<S: AsRef<str>>(values: &[S]) -> Result<Vec<Name>> {
    values.iter().map(|v| Name::parse(v.as_ref())).collect()
}
