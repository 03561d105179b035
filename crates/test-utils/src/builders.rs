#![allow(dead_code)]

use stevedore::config::{
    build_registry, AliasConfig, ComposeConfig, ConfigFile, EnvConfig, ImageConfig, JobConfig,
    MountConfig, RawConfigFile, VolumeConfig,
};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
    working_dir: Option<String>,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
            working_dir: None,
        }
    }

    pub fn project(mut self, project: &str) -> Self {
        self.config.meta.project = Some(project.to_string());
        self
    }

    pub fn default_task(mut self, task: &str) -> Self {
        self.config.meta.default = Some(task.to_string());
        self
    }

    pub fn exec_id(mut self, exec_id: &str) -> Self {
        self.config.meta.exec_id = Some(exec_id.to_string());
        self
    }

    pub fn working_dir(mut self, dir: &str) -> Self {
        self.working_dir = Some(dir.to_string());
        self
    }

    pub fn image(mut self, name: &str, image: ImageConfig) -> Self {
        self.config.image.insert(name.to_string(), image);
        self
    }

    pub fn job(mut self, name: &str, job: JobConfig) -> Self {
        self.config.job.insert(name.to_string(), job);
        self
    }

    pub fn mount(mut self, name: &str, mount: MountConfig) -> Self {
        self.config.mount.insert(name.to_string(), mount);
        self
    }

    pub fn alias(mut self, name: &str, tasks: &[&str]) -> Self {
        self.config.alias.insert(
            name.to_string(),
            AliasConfig {
                tasks: tasks.iter().map(|t| t.to_string()).collect(),
                ..AliasConfig::default()
            },
        );
        self
    }

    pub fn env(mut self, name: &str, env: EnvConfig) -> Self {
        self.config.env.insert(name.to_string(), env);
        self
    }

    pub fn compose(mut self, name: &str, compose: ComposeConfig) -> Self {
        self.config.compose.insert(name.to_string(), compose);
        self
    }

    pub fn volume(mut self, name: &str, volume: VolumeConfig) -> Self {
        self.config.volume.insert(name.to_string(), volume);
        self
    }

    /// Validate and build.
    pub fn build(self) -> ConfigFile {
        let dir = self.working_dir.clone();
        let cfg = ConfigFile::try_from(self.config).expect("Failed to build valid config from builder");
        match dir {
            Some(dir) => cfg.with_working_dir(dir),
            None => cfg,
        }
    }

    /// Build without semantic validation (e.g. to test dangling references).
    pub fn build_unchecked(self) -> ConfigFile {
        let meta = self.config.meta.clone();
        let registry = build_registry(self.config).expect("Failed to merge config sections");
        let cfg = ConfigFile::new_unchecked(meta, registry);
        match self.working_dir {
            Some(dir) => cfg.with_working_dir(dir),
            None => cfg,
        }
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An image resource built from `.` with the default tag.
pub fn image(repository: &str) -> ImageConfig {
    ImageConfig {
        image: repository.to_string(),
        context: ".".to_string(),
        ..ImageConfig::default()
    }
}

/// A job resource running `command` in the image resource `use_image`.
pub fn job(use_image: &str, command: &str) -> JobConfig {
    JobConfig {
        use_image: use_image.to_string(),
        command: Some(command.to_string()),
        ..JobConfig::default()
    }
}

/// A bind mount of host path `bind` at container path `path`.
pub fn bind_mount(bind: &str, path: &str) -> MountConfig {
    MountConfig {
        bind: Some(bind.to_string()),
        path: path.to_string(),
        ..MountConfig::default()
    }
}

/// A named volume mounted at container path `path`.
pub fn named_mount(name: &str, path: &str) -> MountConfig {
    MountConfig {
        name: Some(name.to_string()),
        path: path.to_string(),
        ..MountConfig::default()
    }
}

pub fn compose(files: &[&str]) -> ComposeConfig {
    ComposeConfig {
        files: files.iter().map(|f| f.to_string()).collect(),
        ..ComposeConfig::default()
    }
}

pub fn env_vars(vars: &[&str]) -> EnvConfig {
    EnvConfig {
        variables: vars.iter().map(|v| v.to_string()).collect(),
        ..EnvConfig::default()
    }
}
