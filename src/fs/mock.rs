// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { content: Vec<u8>, modified: SystemTime },
    Dir { children: Vec<String>, modified: SystemTime }, // child names
}

/// In-memory filesystem with a logical clock.
///
/// Every write advances the clock by one second, so a file written later is
/// always newer than one written earlier. Use [`MockFileSystem::set_modified`]
/// to pin a timestamp explicitly.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    clock: Arc<AtomicU64>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(
            PathBuf::from("."),
            MockEntry::Dir { children: Vec::new(), modified: SystemTime::UNIX_EPOCH },
        );

        Self {
            files: Arc::new(Mutex::new(files)),
            clock: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Current value of the logical clock.
    pub fn now(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(self.clock.load(Ordering::SeqCst))
    }

    fn tick(&self) -> SystemTime {
        let secs = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let modified = self.tick();
        self.insert_file(path.as_ref(), content.into(), modified);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut files = self.entries();
        let modified = self.tick();
        Self::ensure_dir_entry(&mut files, path.as_ref(), modified);
    }

    /// Override the modification time of an existing entry.
    pub fn set_modified(&self, path: impl AsRef<Path>, time: SystemTime) {
        let mut files = self.entries();
        match files.get_mut(path.as_ref()) {
            Some(MockEntry::File { modified, .. }) | Some(MockEntry::Dir { modified, .. }) => {
                *modified = time;
            }
            None => {}
        }
    }

    fn insert_file(&self, path: &Path, content: Vec<u8>, modified: SystemTime) {
        let mut files = self.entries();
        files.insert(path.to_path_buf(), MockEntry::File { content, modified });

        // Ensure parent directories exist implicitly for simplicity in this mock
        let parent = parent_or_root(path);
        Self::ensure_dir_entry(&mut files, parent, modified);
        Self::link_child(&mut files, parent, path);
    }

    fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path, modified: SystemTime) {
        if files.contains_key(path) {
            return;
        }
        files.insert(
            path.to_path_buf(),
            MockEntry::Dir { children: Vec::new(), modified },
        );
        let parent = parent_or_root(path);
        if parent != path {
            // Avoid infinite loop at root
            Self::ensure_dir_entry(files, parent, modified);
            Self::link_child(files, parent, path);
        }
    }

    fn link_child(files: &mut HashMap<PathBuf, MockEntry>, parent: &Path, child: &Path) {
        if let Some(MockEntry::Dir { children, .. }) = files.get_mut(parent) {
            if let Some(name) = child.file_name().and_then(|n| n.to_str()) {
                if !children.iter().any(|c| c == name) {
                    children.push(name.to_string());
                }
            }
        }
    }
}

fn parent_or_root(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => path,
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let files = self.entries();
        match files.get(path) {
            Some(MockEntry::File { content, .. }) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir { .. }) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.entries().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.entries().get(path), Some(MockEntry::File { .. }))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.entries().get(path), Some(MockEntry::Dir { .. }))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        if self.is_file(path) {
            return Err(anyhow!("File exists: {:?}", path));
        }
        self.add_dir(path);
        Ok(())
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        match self.entries().get(path) {
            Some(MockEntry::File { modified, .. }) | Some(MockEntry::Dir { modified, .. }) => {
                Ok(*modified)
            }
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.entries();
        match files.get(path) {
            Some(MockEntry::Dir { children, .. }) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
