// tests/docker_cli.rs
//
// Drives `DockerCli` against a shell script standing in for the engine.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use stevedore::exec::{ContainerBackend, DockerCli};
use tempfile::TempDir;

/// Write an engine stub that logs its arguments and fails `container
/// inspect` unless `container_exists`.
fn engine(container_exists: bool) -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let log = dir.path().join("calls.log");
    let program = dir.path().join("engine");
    let inspect_status = if container_exists { 0 } else { 1 };
    let script = format!(
        "#!/bin/sh\necho \"$*\" >> '{}'\nif [ \"$1\" = container ] && [ \"$2\" = inspect ]; then\n  echo 'Error: No such container' >&2\n  exit {}\nfi\nexit 0\n",
        log.display(),
        inspect_status
    );
    fs::write(&program, script).expect("write engine stub");
    fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).expect("chmod engine stub");
    (dir, program, log)
}

fn calls(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

// One test so no other thread forks while a stub is still open for writing.
#[tokio::test]
async fn container_removal_reports_whether_a_container_existed() {
    let (_missing_dir, missing, missing_log) = engine(false);
    let (_existing_dir, existing, existing_log) = engine(true);

    let removed = DockerCli::with_program(missing.to_string_lossy())
        .remove_container("demo-test-compile")
        .await
        .unwrap();
    assert!(!removed);
    assert_eq!(calls(&missing_log), vec!["container inspect demo-test-compile"]);

    let removed = DockerCli::with_program(existing.to_string_lossy())
        .remove_container("demo-test-compile")
        .await
        .unwrap();
    assert!(removed);
    assert_eq!(
        calls(&existing_log),
        vec![
            "container inspect demo-test-compile",
            "rm --force --volumes demo-test-compile",
        ]
    );
}
