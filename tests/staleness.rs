// tests/staleness.rs

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use stevedore::fs::mock::MockFileSystem;
use stevedore::fs::walk_files;
use stevedore::task::staleness::{expand_patterns, is_newer, newest, oldest_existing};

fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

fn tree() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/src/main.rs", "");
    fs.add_file("/proj/src/lib/util.rs", "");
    fs.add_file("/proj/README.md", "");
    fs.set_modified("/proj/src/main.rs", at(100));
    fs.set_modified("/proj/src/lib/util.rs", at(300));
    fs.set_modified("/proj/README.md", at(200));
    fs
}

#[test]
fn walk_lists_every_file_below_a_directory() {
    let fs = tree();
    let mut files = walk_files(&fs, Path::new("/proj/src")).unwrap();
    files.sort();
    assert_eq!(
        files,
        vec![
            PathBuf::from("/proj/src/lib/util.rs"),
            PathBuf::from("/proj/src/main.rs"),
        ]
    );

    assert_eq!(
        walk_files(&fs, Path::new("/proj/README.md")).unwrap(),
        vec![PathBuf::from("/proj/README.md")]
    );
    assert!(walk_files(&fs, Path::new("/proj/absent")).unwrap().is_empty());
}

#[test]
fn patterns_mix_plain_paths_and_globs() {
    let fs = tree();
    let mut paths = expand_patterns(
        &fs,
        Path::new("/proj"),
        &["src/**/*.rs".to_string(), "dist/app".to_string()],
    )
    .unwrap();
    paths.sort();

    assert_eq!(
        paths,
        vec![
            PathBuf::from("/proj/dist/app"),
            PathBuf::from("/proj/src/lib/util.rs"),
            PathBuf::from("/proj/src/main.rs"),
        ]
    );
}

#[test]
fn invalid_glob_is_an_error() {
    let fs = tree();
    assert!(expand_patterns(&fs, Path::new("/proj"), &["src/[".to_string()]).is_err());
}

#[test]
fn newest_walks_directories_and_skips_missing_paths() {
    let fs = tree();
    let newest_time = newest(
        &fs,
        &[PathBuf::from("/proj/src"), PathBuf::from("/proj/missing")],
    )
    .unwrap();
    assert_eq!(newest_time, Some(at(300)));

    assert_eq!(newest(&fs, &[PathBuf::from("/proj/missing")]).unwrap(), None);
}

#[test]
fn oldest_existing_requires_every_path() {
    let fs = tree();
    assert_eq!(
        oldest_existing(
            &fs,
            &[PathBuf::from("/proj/README.md"), PathBuf::from("/proj/src/main.rs")]
        )
        .unwrap(),
        Some(at(100))
    );
    assert_eq!(
        oldest_existing(
            &fs,
            &[PathBuf::from("/proj/README.md"), PathBuf::from("/proj/dist/app")]
        )
        .unwrap(),
        None
    );
}

#[test]
fn directories_count_as_their_newest_file() {
    let fs = tree();
    fs.set_modified("/proj/src", at(50));
    assert_eq!(
        oldest_existing(&fs, &[PathBuf::from("/proj/src")]).unwrap(),
        Some(at(300))
    );

    fs.add_dir("/proj/empty");
    fs.set_modified("/proj/empty", at(40));
    assert_eq!(
        oldest_existing(&fs, &[PathBuf::from("/proj/empty")]).unwrap(),
        Some(at(40))
    );
}

#[test]
fn trailing_separator_names_the_directory() {
    let fs = tree();
    assert_eq!(
        expand_patterns(&fs, Path::new("/proj"), &["src/".to_string()]).unwrap(),
        vec![PathBuf::from("/proj/src")]
    );
}

#[test]
fn newer_is_strict() {
    assert!(is_newer(Some(at(2)), at(1)));
    assert!(!is_newer(Some(at(1)), at(1)));
    assert!(!is_newer(None, at(0)));
}
