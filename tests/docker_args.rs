// tests/docker_args.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use stevedore::exec::docker::{build_args, compose_args, create_args, run_args};
use stevedore::exec::{BuildRequest, ComposeCommand, ComposeRequest, ContainerSpec, MountSpec};

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn build_passes_tags_dockerfile_and_build_args() {
    let mut build = BTreeMap::new();
    build.insert("VERSION".to_string(), "1.0".to_string());
    let request = BuildRequest {
        context: PathBuf::from("/proj/app"),
        dockerfile: Some(PathBuf::from("/proj/app/Dockerfile.dev")),
        tags: args(&["demo/app:1.0", "demo/app:latest"]),
        args: build,
    };

    assert_eq!(
        build_args(&request),
        args(&[
            "build",
            "--tag",
            "demo/app:1.0",
            "--tag",
            "demo/app:latest",
            "--file",
            "/proj/app/Dockerfile.dev",
            "--build-arg",
            "VERSION=1.0",
            "/proj/app",
        ])
    );
}

#[test]
fn run_places_options_before_the_image_and_command_after() {
    let spec = ContainerSpec {
        name: "demo-ci-compile".to_string(),
        image: "demo/builder:latest".to_string(),
        command: Some(args(&["make", "all"])),
        env: args(&["MODE=release"]),
        mounts: vec![
            MountSpec::Bind {
                host: PathBuf::from("/proj/src"),
                container: "/work".to_string(),
                read_only: false,
            },
            MountSpec::Volume {
                name: "cache".to_string(),
                container: "/cache".to_string(),
                read_only: true,
            },
        ],
        devices: args(&["/dev/fb0:/dev/fb0:rwm"]),
        working_dir: Some("/work".to_string()),
        privileged: true,
        ..ContainerSpec::default()
    };

    assert_eq!(
        run_args(&spec),
        args(&[
            "run",
            "--name",
            "demo-ci-compile",
            "--privileged",
            "--env",
            "MODE=release",
            "--volume",
            "/proj/src:/work:rw",
            "--volume",
            "cache:/cache:ro",
            "--device",
            "/dev/fb0:/dev/fb0:rwm",
            "--workdir",
            "/work",
            "demo/builder:latest",
            "make",
            "all",
        ])
    );
}

#[test]
fn entrypoint_words_after_the_first_precede_the_command() {
    let spec = ContainerSpec {
        name: "c".to_string(),
        image: "img".to_string(),
        entrypoint: Some(args(&["sh", "-c"])),
        command: Some(args(&["echo hi"])),
        interactive: true,
        ..ContainerSpec::default()
    };

    assert_eq!(
        create_args(&spec),
        args(&[
            "create",
            "--name",
            "c",
            "--interactive",
            "--tty",
            "--entrypoint",
            "sh",
            "img",
            "-c",
            "echo hi",
        ])
    );
}

#[test]
fn compose_up_and_down() {
    let mut request = ComposeRequest {
        project: "demo".to_string(),
        files: vec![PathBuf::from("/proj/dc.yml"), PathBuf::from("/proj/dc.override.yml")],
        command: ComposeCommand::Up { detach: true },
    };
    assert_eq!(
        compose_args(&request),
        args(&[
            "compose",
            "--project-name",
            "demo",
            "--file",
            "/proj/dc.yml",
            "--file",
            "/proj/dc.override.yml",
            "up",
            "--detach",
        ])
    );

    request.command = ComposeCommand::Down;
    assert_eq!(compose_args(&request).last().map(String::as_str), Some("down"));
}
