// tests/run_entry.rs
mod common;
use crate::common::{fake_context, write_config};

use clap::Parser;
use stevedore::cli::{CliArgs, LogLevel};
use stevedore::config::loader::load_and_validate;
use stevedore::engine::Settings;
use stevedore::errors::StevedoreError;
use stevedore::fs::mock::MockFileSystem;
use stevedore::logging::effective_level;
use stevedore::{format_resources, requested_tasks, run_tasks};
use stevedore_test_utils::builders::ConfigFileBuilder;
use stevedore_test_utils::fake_backend::RecordingBackend;
use stevedore_test_utils::scripted::RecordingReporter;

#[test]
fn explicit_tasks_win_over_the_default() {
    let cfg = ConfigFileBuilder::new()
        .alias("all", &["x"])
        .default_task("all")
        .build_unchecked();

    assert_eq!(
        requested_tasks(&cfg, &["x:run".to_string()]).unwrap(),
        vec!["x:run".to_string()]
    );
    assert_eq!(requested_tasks(&cfg, &[]).unwrap(), vec!["all".to_string()]);
}

#[test]
fn no_tasks_and_no_default_is_an_error() {
    let cfg = ConfigFileBuilder::new().alias("all", &["x"]).build_unchecked();

    let err = requested_tasks(&cfg, &[]).unwrap_err();
    assert!(matches!(err, StevedoreError::NoDefaultTask));
    assert_eq!(err.to_string(), "no task to run, and no default task defined");
}

#[tokio::test]
async fn collection_errors_prevent_any_execution() {
    let cfg = ConfigFileBuilder::new()
        .alias("all", &["data", "missing"])
        .volume(
            "data",
            stevedore::config::VolumeConfig {
                path: "data".to_string(),
                mount: "/data".to_string(),
                ..Default::default()
            },
        )
        .working_dir("/proj")
        .build();
    let backend = RecordingBackend::new();
    let fs = MockFileSystem::new();
    let mut ctx = fake_context(&cfg, &backend, &fs, Settings::default());
    let reporter = RecordingReporter::new();

    let err = run_tasks(&cfg, &["all"], &mut ctx, &reporter).await.unwrap_err();

    assert!(matches!(err, StevedoreError::UnknownResource(ref n) if n == "missing"));
    assert!(reporter.started().is_empty());
    assert!(!stevedore::fs::FileSystem::exists(&fs, std::path::Path::new("/proj/data")));
}

#[tokio::test]
async fn loaded_config_runs_end_to_end() {
    let (dir, path) = write_config(
        r#"
[meta]
project = "demo"
default = "all"

[volume.data]
path = "data"
mount = "/data"

[env.settings]
variables = ["MODE=release"]

[alias.all]
tasks = ["settings", "data"]
"#,
    );
    let cfg = load_and_validate(&path).unwrap();
    let backend = RecordingBackend::new();
    let fs = MockFileSystem::new();
    let mut ctx = fake_context(&cfg, &backend, &fs, Settings::default());
    let reporter = RecordingReporter::new();

    let requested = requested_tasks(&cfg, &[]).unwrap();
    let summary = run_tasks(&cfg, &requested, &mut ctx, &reporter).await.unwrap();

    assert_eq!(reporter.started(), vec!["settings:set", "data:create", "all:run"]);
    assert_eq!(reporter.completed("all:run"), Some(true));
    assert!(summary.any_modified());
    assert_eq!(ctx.env().var("MODE"), Some("release"));
    assert!(stevedore::fs::FileSystem::is_dir(&fs, &dir.path().join("data")));
}

#[test]
fn cli_parses_tasks_and_flags() {
    let args = CliArgs::try_parse_from([
        "stevedore",
        "--quiet",
        "--no-bind-mount",
        "--config",
        "ci.toml",
        "build",
        "test:run",
    ])
    .unwrap();

    assert_eq!(args.tasks, vec!["build", "test:run"]);
    assert_eq!(args.config, "ci.toml");
    assert!(args.quiet);
    assert!(args.no_bind_mount);
    assert!(!args.dry_run);
}

#[test]
fn cli_defaults() {
    let args = CliArgs::try_parse_from(["stevedore"]).unwrap();
    assert!(args.tasks.is_empty());
    assert_eq!(args.config, "stevedore.toml");
    assert_eq!(args.log_level, None);
}

#[test]
fn listing_shows_descriptions_and_filters_by_tag() {
    let (_dir, path) = write_config(
        r#"
[meta]
default = "all"

[volume.data]
path = "data"
mount = "/data"
annotations = { description = "Scratch space", tags = ["storage"] }

[alias.all]
tasks = ["data"]
"#,
    );
    let cfg = load_and_validate(&path).unwrap();

    let listing = format_resources(&cfg, &[]);
    let data = listing.lines().find(|l| l.contains("data ")).unwrap();
    assert!(data.contains("volume"), "{listing}");
    assert!(data.ends_with("Scratch space [storage]"), "{listing}");
    let all = listing.lines().find(|l| l.contains("all ")).unwrap();
    assert!(all.ends_with("Run tasks: data"), "{listing}");
    assert!(listing.ends_with("default: all"), "{listing}");

    let filtered = format_resources(&cfg, &["storage".to_string()]);
    assert!(filtered.contains("Scratch space"), "{filtered}");
    assert!(!filtered.contains("Run tasks"), "{filtered}");
}

#[test]
fn tag_filter_requires_list() {
    let args = CliArgs::try_parse_from(["stevedore", "--list", "--tag", "build"]).unwrap();
    assert_eq!(args.tags, vec!["build"]);
    assert!(CliArgs::try_parse_from(["stevedore", "--tag", "build"]).is_err());
}

#[test]
fn list_conflicts_with_dry_run() {
    assert!(CliArgs::try_parse_from(["stevedore", "--list", "--dry-run"]).is_err());
}

#[test]
fn log_level_priority() {
    use tracing::Level;

    assert_eq!(effective_level(Some(LogLevel::Debug), Some("error"), true), Level::DEBUG);
    assert_eq!(effective_level(None, Some("trace"), true), Level::TRACE);
    assert_eq!(effective_level(None, Some("nonsense"), false), Level::INFO);
    assert_eq!(effective_level(None, None, true), Level::WARN);
    assert_eq!(effective_level(None, None, false), Level::INFO);
}
