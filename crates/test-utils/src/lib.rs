pub mod builders;
pub mod fake_backend;
pub mod scripted;

use std::path::Path;
use std::sync::{Arc, Once};

use stevedore::config::{ConfigFile, ExecEnv};
use stevedore::engine::{ExecutionContext, Settings};
use stevedore::fs::mock::MockFileSystem;
use tracing_subscriber::{fmt, EnvFilter};

use crate::fake_backend::RecordingBackend;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// A deterministic variable environment: project `demo`, exec id `test`,
/// no process variables.
pub fn test_env(working_dir: impl AsRef<Path>) -> ExecEnv {
    ExecEnv::new("demo", working_dir.as_ref(), Default::default()).with_exec_id("test")
}

/// Execution context over fakes, rooted at `cfg`'s working directory.
pub fn fake_context(
    cfg: &ConfigFile,
    backend: &RecordingBackend,
    fs: &MockFileSystem,
    settings: Settings,
) -> ExecutionContext {
    ExecutionContext::new(
        test_env(cfg.working_dir()),
        Arc::new(backend.clone()),
        Arc::new(fs.clone()),
        settings,
    )
}
