// tests/resolve.rs

use std::collections::BTreeMap;

use stevedore::config::{ExecEnv, ImageConfig, Resource, ResolveError};
use stevedore_test_utils::builders::{bind_mount, compose, image};

fn env() -> ExecEnv {
    let mut vars = BTreeMap::new();
    vars.insert("VERSION".to_string(), "1.2".to_string());
    vars.insert("USER".to_string(), "dana".to_string());
    ExecEnv::new("demo", "/proj", vars).with_exec_id("ci-7")
}

#[test]
fn substitutes_builtin_and_environment_variables() {
    let env = env();
    assert_eq!(env.resolve("{project}-{exec-id}").unwrap(), "demo-ci-7");
    assert_eq!(env.resolve("{work-dir}/out").unwrap(), "/proj/out");
    assert_eq!(env.resolve("v{env.VERSION}").unwrap(), "v1.2");
    assert_eq!(env.resolve("{user.name}").unwrap(), "dana");
    assert_eq!(env.resolve("plain").unwrap(), "plain");
}

#[test]
fn environment_defaults_apply_only_when_unset() {
    let env = env();
    assert_eq!(env.resolve("{env.MISSING:fallback}").unwrap(), "fallback");
    assert_eq!(env.resolve("{env.VERSION:0.0}").unwrap(), "1.2");
    assert_eq!(env.resolve("{env.MISSING:}").unwrap(), "");
}

#[test]
fn doubled_braces_are_literal() {
    assert_eq!(env().resolve("{{project}}").unwrap(), "{project}");
}

#[test]
fn errors_name_the_problem() {
    let env = env();
    assert_eq!(
        env.resolve("{env.MISSING}"),
        Err(ResolveError::UnsetEnv("MISSING".to_string()))
    );
    assert_eq!(
        env.resolve("{nonsense}"),
        Err(ResolveError::UnknownVariable("nonsense".to_string()))
    );
    assert!(matches!(
        env.resolve("oops {"),
        Err(ResolveError::UnbalancedBrace(_))
    ));
}

#[test]
fn variables_set_at_run_time_are_visible() {
    let mut env = env();
    env.set_var("TOKEN", "abc");
    assert_eq!(env.resolve("{env.TOKEN}").unwrap(), "abc");
}

#[test]
fn resolving_a_resource_leaves_the_original_unchanged() {
    let original = Resource::Image(ImageConfig {
        tags: vec!["{env.VERSION}".to_string()],
        ..image("demo/{project}")
    });

    let resolved = original.resolve(&env()).unwrap();

    match (&original, &resolved) {
        (Resource::Image(before), Resource::Image(after)) => {
            assert_eq!(before.reference(), "demo/{project}:{env.VERSION}");
            assert_eq!(after.reference(), "demo/demo:1.2");
        }
        _ => panic!("kind changed during resolution"),
    }
}

#[test]
fn compose_project_defaults_to_the_project_name() {
    let resolved = Resource::Compose(compose(&["dc.yml"])).resolve(&env()).unwrap();
    match resolved {
        Resource::Compose(c) => assert_eq!(c.project_name(), "demo"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn bind_paths_drop_trailing_separators() {
    let resolved = Resource::Mount(bind_mount("out/{env.VERSION}/", "/out"))
        .resolve(&env())
        .unwrap();
    match resolved {
        Resource::Mount(m) => assert_eq!(m.bind.as_deref(), Some("out/1.2")),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn home_directory_is_expanded_in_bind_paths() {
    let Some(home) = dirs::home_dir() else {
        return;
    };
    let resolved = Resource::Mount(bind_mount("~/.cache", "/cache"))
        .resolve(&env())
        .unwrap();
    match resolved {
        Resource::Mount(m) => {
            assert_eq!(m.bind, Some(home.join(".cache").to_string_lossy().into_owned()));
        }
        other => panic!("unexpected {other:?}"),
    }
}
