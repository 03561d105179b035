// tests/config_loading.rs
mod common;
use crate::common::write_config;

use stevedore::config::loader::{load_and_validate, load_from_path};
use stevedore::config::{Resource, ResourceKind};
use stevedore::errors::StevedoreError;
use stevedore::types::{MountMode, PullPolicy};

const FULL: &str = r#"
[meta]
project = "demo"
default = "all"
exec_id = "{env.CI_JOB_ID:local}"

[image.builder]
image = "demo/builder"
context = "docker"
tags = ["1.0", "latest"]
args = { VERSION = "1.0" }
pull = "always"

[mount.source]
bind = "."
path = "/work"

[mount.cache]
name = "demo-cache"
path = "/cache"
read_only = true

[volume.out]
path = "dist"
mount = "/out"
mode = "ro"

[job.compile]
use = "builder"
mounts = ["source", "cache", "out"]
command = "make 'all targets'"
artifact = ["dist/app"]
sources = ["src/**/*.rs"]
devices = [{ host = "/dev/fb0", permissions = "rwm" }]
annotations = { description = "Compile the release binary", tags = ["build"] }

[env.settings]
variables = ["MODE=release"]

[compose.services]
files = ["docker-compose.yml"]

[alias.all]
tasks = ["settings", "compile", "services:detach"]
"#;

#[test]
fn loads_every_section() {
    let (dir, path) = write_config(FULL);
    let cfg = load_and_validate(&path).unwrap();

    assert_eq!(cfg.working_dir(), dir.path());
    assert_eq!(cfg.project(), "demo");
    assert_eq!(cfg.default_task(), Some("all"));
    assert_eq!(cfg.resources().count(), 8);

    match cfg.resource("builder") {
        Some(Resource::Image(image)) => {
            assert_eq!(image.reference(), "demo/builder:1.0");
            assert_eq!(image.references(), vec!["demo/builder:1.0", "demo/builder:latest"]);
            assert_eq!(image.pull, PullPolicy::Always);
            assert_eq!(image.args.get("VERSION").map(String::as_str), Some("1.0"));
        }
        other => panic!("expected image, got {other:?}"),
    }

    match cfg.resource("compile") {
        Some(Resource::Job(job)) => {
            assert_eq!(job.use_image, "builder");
            assert_eq!(
                job.command_args(),
                Some(vec!["make".to_string(), "all targets".to_string()])
            );
            assert_eq!(job.devices.len(), 1);
            assert_eq!(job.devices[0].spec(), "/dev/fb0:/dev/fb0:rwm");
        }
        other => panic!("expected job, got {other:?}"),
    }

    match cfg.resource("out") {
        Some(Resource::Volume(volume)) => assert_eq!(volume.mode, MountMode::Ro),
        other => panic!("expected volume, got {other:?}"),
    }

    assert_eq!(cfg.resource("services").map(Resource::kind), Some(ResourceKind::Compose));

    let compile = cfg.resource("compile").unwrap().annotations();
    assert_eq!(compile.description(), Some("Compile the release binary"));
    assert!(compile.has_tag("build"));
    assert_eq!(cfg.resource("builder").unwrap().annotations().description(), None);
}

#[test]
fn annotations_are_accepted_on_every_kind() {
    let (_dir, path) = write_config(
        r#"
[volume.data]
path = "data"
mount = "/data"

[volume.data.annotations]
description = "Scratch space"
tags = ["storage"]

[alias.all]
tasks = ["data"]
annotations = { tags = ["entry"] }
"#,
    );
    let cfg = load_and_validate(&path).unwrap();
    assert_eq!(
        cfg.resource("data").unwrap().annotations().tags,
        vec!["storage".to_string()]
    );
    assert!(cfg.resource("all").unwrap().annotations().has_tag("entry"));
}

#[test]
fn device_permissions_are_checked() {
    let msg = config_error(
        r#"
[image.builder]
image = "demo/builder"

[job.flash]
use = "builder"
devices = [{ host = "/dev/ttyUSB0", permissions = "rx" }]
"#,
    );
    assert!(msg.contains("devices"), "{msg}");
}

#[test]
fn raw_load_does_not_validate() {
    let (_dir, path) = write_config(
        r#"
[job.compile]
use = "nothing"
"#,
    );
    let raw = load_from_path(&path).unwrap();
    assert_eq!(raw.job.len(), 1);
    assert!(load_and_validate(&path).is_err());
}

#[test]
fn project_defaults_to_directory_name() {
    let (dir, path) = write_config(
        r#"
[volume.data]
path = "data"
mount = "/data"
"#,
    );
    let cfg = load_and_validate(&path).unwrap();
    let expected = dir
        .path()
        .canonicalize()
        .unwrap()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert_eq!(cfg.project(), expected);
}

fn config_error(contents: &str) -> String {
    let (_dir, path) = write_config(contents);
    match load_and_validate(&path) {
        Err(StevedoreError::ConfigError(msg)) => msg,
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn duplicate_names_across_sections_are_rejected() {
    let msg = config_error(
        r#"
[image.app]
image = "demo/app"

[job.app]
use = "app"
"#,
    );
    assert!(msg.contains("'app'"), "{msg}");
    assert!(msg.contains("image") && msg.contains("job"), "{msg}");
}

#[test]
fn job_must_use_an_image() {
    let msg = config_error(
        r#"
[volume.data]
path = "data"
mount = "/data"

[job.compile]
use = "data"
"#,
    );
    assert!(msg.contains("job 'compile'"), "{msg}");
    assert!(msg.contains("not an image"), "{msg}");
}

#[test]
fn job_mounts_must_be_mounts() {
    let msg = config_error(
        r#"
[image.builder]
image = "demo/builder"

[job.compile]
use = "builder"
mounts = ["builder"]
"#,
    );
    assert!(msg.contains("mounts"), "{msg}");
}

#[test]
fn mount_needs_exactly_one_source() {
    let msg = config_error(
        r#"
[mount.both]
bind = "."
name = "vol"
path = "/work"
"#,
    );
    assert!(msg.contains("only one of bind or name"), "{msg}");

    let msg = config_error(
        r#"
[mount.relative]
bind = "."
path = "work"
"#,
    );
    assert!(msg.contains("absolute"), "{msg}");
}

#[test]
fn unbalanced_quotes_in_command_are_rejected() {
    let msg = config_error(
        r#"
[image.builder]
image = "demo/builder"

[job.compile]
use = "builder"
command = "echo 'unterminated"
"#,
    );
    assert!(msg.contains("command"), "{msg}");
}

#[test]
fn empty_alias_and_malformed_default_are_rejected() {
    let msg = config_error(
        r#"
[alias.all]
tasks = []
"#,
    );
    assert!(msg.contains("at least one task"), "{msg}");

    let msg = config_error(
        r#"
[meta]
default = "all:"

[alias.all]
tasks = ["x"]
"#,
    );
    assert!(msg.contains("[meta].default"), "{msg}");
}

#[test]
fn empty_config_is_rejected() {
    let msg = config_error("[meta]\nproject = \"demo\"\n");
    assert!(msg.contains("at least one resource"), "{msg}");
}

#[test]
fn unknown_fields_are_a_toml_error() {
    let (_dir, path) = write_config(
        r#"
[image.builder]
image = "demo/builder"
colour = "blue"
"#,
    );
    assert!(matches!(load_and_validate(&path), Err(StevedoreError::TomlError(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_and_validate(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, StevedoreError::IoError(_)));
}
