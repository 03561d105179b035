use std::fmt;
use std::str::FromStr;
use serde::Deserialize;

/// When an `image:pull` task should contact the registry.
///
/// - `Always`: pull on every run.
/// - `Once`: pull only if the image is not present locally (default).
/// - `Never`: never pull; a missing image is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullPolicy {
    Always,
    Once,
    Never,
}

impl Default for PullPolicy {
    fn default() -> Self {
        PullPolicy::Once
    }
}

impl FromStr for PullPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "always" => Ok(PullPolicy::Always),
            "once" => Ok(PullPolicy::Once),
            "never" => Ok(PullPolicy::Never),
            other => Err(format!(
                "invalid pull policy: {other} (expected \"always\", \"once\" or \"never\")"
            )),
        }
    }
}

/// Access mode of a host directory mounted into a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountMode {
    /// Read-write (default).
    Rw,
    /// Read-only.
    Ro,
}

impl Default for MountMode {
    fn default() -> Self {
        MountMode::Rw
    }
}

impl MountMode {
    pub fn is_read_only(self) -> bool {
        self == MountMode::Ro
    }
}

impl fmt::Display for MountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountMode::Rw => f.write_str("rw"),
            MountMode::Ro => f.write_str("ro"),
        }
    }
}

impl FromStr for MountMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rw" => Ok(MountMode::Rw),
            "ro" => Ok(MountMode::Ro),
            other => Err(format!("invalid mount mode: {other} (expected \"rw\" or \"ro\")")),
        }
    }
}
