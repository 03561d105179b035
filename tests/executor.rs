// tests/executor.rs
mod common;
use crate::common::init_tracing;

use stevedore::config::ConfigFile;
use stevedore::engine::{execute_tasks, ExecutionContext, Settings};
use stevedore::errors::StevedoreError;
use stevedore::fs::mock::MockFileSystem;
use stevedore::task::Name;
use stevedore_test_utils::builders::ConfigFileBuilder;
use stevedore_test_utils::fake_backend::RecordingBackend;
use stevedore_test_utils::scripted::{RecordingReporter, Script, ScriptedPlan};

fn context() -> ExecutionContext {
    let cfg: ConfigFile = ConfigFileBuilder::new()
        .alias("placeholder", &["x"])
        .working_dir("/proj")
        .build_unchecked();
    common::fake_context(
        &cfg,
        &RecordingBackend::new(),
        &MockFileSystem::new(),
        Settings::default(),
    )
}

#[tokio::test]
async fn modified_dependency_is_observed_by_dependents() {
    init_tracing();
    let (tasks, log) = ScriptedPlan::new()
        .task("x:run", &[], Script::modified())
        .task("y:run", &["x:run"], Script::unmodified())
        .task("z:run", &["y:run"], Script::unmodified())
        .build();
    let mut ctx = context();
    let reporter = RecordingReporter::new();

    let summary = execute_tasks(&mut ctx, &tasks, &reporter).await.unwrap();

    assert_eq!(log.deps_modified_of("x:run"), vec![false]);
    assert_eq!(log.deps_modified_of("y:run"), vec![true]);
    // y did no work, so z sees nothing modified.
    assert_eq!(log.deps_modified_of("z:run"), vec![false]);

    assert!(ctx.is_modified(&Name::new("x", "run")));
    assert!(!ctx.is_modified(&Name::new("y", "run")));
    assert_eq!(summary.modified().cloned().collect::<Vec<_>>(), vec![Name::new("x", "run")]);
    assert_eq!(reporter.completed("x:run"), Some(true));
    assert_eq!(reporter.completed("z:run"), Some(false));
}

#[tokio::test]
async fn any_modified_dependency_is_enough() {
    let (tasks, log) = ScriptedPlan::new()
        .task("a:run", &[], Script::unmodified())
        .task("b:run", &[], Script::modified())
        .task("c:run", &["a:run", "b:run"], Script::unmodified())
        .build();
    let mut ctx = context();

    execute_tasks(&mut ctx, &tasks, &RecordingReporter::new())
        .await
        .unwrap();

    assert_eq!(log.deps_modified_of("c:run"), vec![true]);
}

#[tokio::test]
async fn all_started_tasks_are_stopped_in_reverse_order() {
    let (tasks, log) = ScriptedPlan::new()
        .task("a:run", &[], Script::unmodified())
        .task("b:run", &["a:run"], Script::modified())
        .task("c:run", &["b:run"], Script::unmodified())
        .build();
    let mut ctx = context();

    execute_tasks(&mut ctx, &tasks, &RecordingReporter::new())
        .await
        .unwrap();

    assert_eq!(log.runs(), vec!["a:run", "b:run", "c:run"]);
    assert_eq!(log.stops(), vec!["c:run", "b:run", "a:run"]);
}

#[tokio::test]
async fn failure_stops_started_tasks_and_skips_the_rest() {
    init_tracing();
    let (tasks, log) = ScriptedPlan::new()
        .task("A:run", &[], Script::modified())
        .task("B:run", &["A:run"], Script::failing())
        .task("C:run", &["B:run"], Script::unmodified())
        .build();
    let mut ctx = context();
    let reporter = RecordingReporter::new();

    let err = execute_tasks(&mut ctx, &tasks, &reporter).await.unwrap_err();

    match &err {
        StevedoreError::Run { task, .. } => assert_eq!(task, &Name::new("B", "run")),
        other => panic!("expected Run error, got {other:?}"),
    }
    assert!(err.to_string().contains("\"B:run\""));
    assert!(err.to_string().contains("scripted failure"));

    assert_eq!(log.runs(), vec!["A:run", "B:run"]);
    assert_eq!(log.stops(), vec!["B:run", "A:run"]);
    assert_eq!(reporter.started(), vec!["A:run", "B:run"]);
    assert_eq!(reporter.completed("B:run"), None);
    assert_eq!(reporter.completed("C:run"), None);
}

#[tokio::test]
async fn stop_failures_are_reported_and_do_not_mask_the_run_error() {
    let (tasks, log) = ScriptedPlan::new()
        .task("a:run", &[], Script::unmodified().failing_stop())
        .task("b:run", &[], Script::unmodified().failing_stop())
        .task("c:run", &[], Script::failing())
        .build();
    let mut ctx = context();
    let reporter = RecordingReporter::new();

    let err = execute_tasks(&mut ctx, &tasks, &reporter).await.unwrap_err();

    assert!(matches!(err, StevedoreError::Run { ref task, .. } if task == &Name::new("c", "run")));
    // Cleanup continued past both failing stops.
    assert_eq!(log.stops(), vec!["c:run", "b:run", "a:run"]);
    let failures = reporter.stop_failures();
    assert_eq!(failures.len(), 2);
    assert!(failures[0].contains("\"b:run\""));
    assert!(failures[1].contains("\"a:run\""));
}

#[tokio::test]
async fn stop_failure_after_success_keeps_the_run_successful() {
    let (tasks, _log) = ScriptedPlan::new()
        .task("a:run", &[], Script::modified().failing_stop())
        .build();
    let mut ctx = context();
    let reporter = RecordingReporter::new();

    let summary = execute_tasks(&mut ctx, &tasks, &reporter).await.unwrap();

    assert!(summary.any_modified());
    assert_eq!(reporter.stop_failures().len(), 1);
}

#[tokio::test]
async fn unchanged_rerun_reports_nothing_modified() {
    let plan = || {
        ScriptedPlan::new()
            .task("a:run", &[], Script::unmodified())
            .task("b:run", &["a:run"], Script::unmodified())
            .build()
    };

    for _ in 0..2 {
        let (tasks, _log) = plan();
        let mut ctx = context();
        let summary = execute_tasks(&mut ctx, &tasks, &RecordingReporter::new())
            .await
            .unwrap();
        assert!(!summary.any_modified());
        assert!(summary.outcomes.iter().all(|o| !o.modified));
    }
}

#[tokio::test]
async fn diamond_dependency_executes_once_per_path() {
    let (tasks, log) = ScriptedPlan::new()
        .task("D:run", &[], Script::modified())
        .task("B:run", &["D:run"], Script::unmodified())
        .task("D:run", &[], Script::modified())
        .task("C:run", &["D:run"], Script::unmodified())
        .task("A:run", &["B:run", "C:run"], Script::unmodified())
        .build();
    let mut ctx = context();

    execute_tasks(&mut ctx, &tasks, &RecordingReporter::new())
        .await
        .unwrap();

    assert_eq!(log.runs(), vec!["D:run", "B:run", "D:run", "C:run", "A:run"]);
    assert_eq!(log.stops().iter().filter(|s| *s == "D:run").count(), 2);
}

#[tokio::test]
async fn resolution_failure_aborts_and_cleans_up() {
    use stevedore::config::{Resource, VolumeConfig};
    use stevedore::task::TaskConfig;

    let (scripted, log) = ScriptedPlan::new()
        .task("a:run", &[], Script::modified())
        .build();

    let mut configs: Vec<TaskConfig> = scripted.all().to_vec();
    let unresolvable = Resource::Volume(VolumeConfig {
        path: "{env.STEVEDORE_TEST_UNSET_VARIABLE}".to_string(),
        mount: "/data".to_string(),
        ..VolumeConfig::default()
    });
    configs.push(TaskConfig::new(
        Name::new("data", "create"),
        unresolvable,
        vec![],
        stevedore::task::volume::create,
    ));
    let tasks = stevedore::dag::TaskCollection::from(configs);
    let mut ctx = context();

    let err = execute_tasks(&mut ctx, &tasks, &RecordingReporter::new())
        .await
        .unwrap_err();

    match &err {
        StevedoreError::Resolution { task, .. } => assert_eq!(task, &Name::new("data", "create")),
        other => panic!("expected Resolution error, got {other:?}"),
    }
    assert_eq!(log.stops(), vec!["a:run"]);
}

#[tokio::test]
async fn resolved_resources_are_stored_in_the_context() {
    let (tasks, _log) = ScriptedPlan::new()
        .task("a:run", &[], Script::unmodified())
        .build();
    let mut ctx = context();

    execute_tasks(&mut ctx, &tasks, &RecordingReporter::new())
        .await
        .unwrap();

    assert!(ctx.resource("a").is_some());
    assert!(ctx.resource("b").is_none());
}
