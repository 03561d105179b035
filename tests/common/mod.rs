#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

pub use stevedore_test_utils::{fake_context, init_tracing};

/// Write `contents` as `stevedore.toml` in a fresh temp dir.
///
/// Returns the dir (keep it alive for the test's duration) and the file path.
pub fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("stevedore.toml");
    fs::write(&path, contents).expect("write config");
    (dir, path)
}
