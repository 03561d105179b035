// src/task/staleness.rs

//! Modification-time helpers used by task kinds to decide whether they are
//! up to date.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use globset::{Glob, GlobSetBuilder};

use crate::fs::{walk_files, FileSystem};

fn is_pattern(value: &str) -> bool {
    value.contains(['*', '?', '[', '{'])
}

/// Expand `patterns` relative to `root`.
///
/// Plain paths are returned as given (joined onto `root`) whether or not they
/// exist, so callers can tell a missing file from an empty match. Glob
/// patterns are matched against every file below `root`.
pub fn expand_patterns(fs: &dyn FileSystem, root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    let mut globs = GlobSetBuilder::new();
    let mut has_globs = false;

    for pattern in patterns {
        if is_pattern(pattern) {
            globs.add(Glob::new(pattern).with_context(|| format!("invalid pattern {pattern:?}"))?);
            has_globs = true;
        } else {
            // `dist/` names a directory artifact.
            paths.push(root.join(pattern.trim_end_matches('/')));
        }
    }

    if has_globs {
        let set = globs.build().context("compiling patterns")?;
        for file in walk_files(fs, root)? {
            let relative = file.strip_prefix(root).unwrap_or(&file);
            if set.is_match(relative) {
                paths.push(file);
            }
        }
    }
    Ok(paths)
}

/// Newest modification time among the files at or below `paths`.
///
/// Missing paths are skipped; `None` if nothing exists.
pub fn newest(fs: &dyn FileSystem, paths: &[PathBuf]) -> Result<Option<SystemTime>> {
    let mut newest = None;
    for path in paths {
        for file in walk_files(fs, path)? {
            let modified = fs.modified(&file)?;
            newest = newest.max(Some(modified));
        }
    }
    Ok(newest)
}

/// Oldest modification time among `paths`, or `None` if there are none or
/// any of them is missing.
///
/// A directory is timed by the newest file below it, or by the directory
/// itself when it is empty.
pub fn oldest_existing(fs: &dyn FileSystem, paths: &[PathBuf]) -> Result<Option<SystemTime>> {
    let mut oldest: Option<SystemTime> = None;
    for path in paths {
        if !fs.exists(path) {
            return Ok(None);
        }
        let modified = match newest(fs, std::slice::from_ref(path))? {
            Some(time) => time,
            None => fs.modified(path)?,
        };
        oldest = Some(oldest.map_or(modified, |o| o.min(modified)));
    }
    Ok(oldest)
}

/// True if `candidate` is strictly newer than `reference`.
pub fn is_newer(candidate: Option<SystemTime>, reference: SystemTime) -> bool {
    candidate.is_some_and(|c| c > reference)
}
