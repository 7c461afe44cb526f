//! In-memory store for embedding and tests.
//!
//! # Responsibility
//! - Implement `FileStore` without touching disk.
//! - Expose hooks to simulate external edits and read failures.
//!
//! # Invariants
//! - Clones share one state; mutations through any clone are visible to all.
//! - A path is either a file or a directory, never both.

use crate::repo::file_store::{EntryKind, FileStore, StoreEntry, StoreError, StoreResult};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Handle for a file managed by `MemoryFileStore`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryHandle(PathBuf);

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<PathBuf, String>,
    directories: BTreeSet<PathBuf>,
    unreadable: BTreeSet<PathBuf>,
    list_calls: usize,
}

impl MemoryState {
    fn kind_of(&self, path: &Path) -> Option<EntryKind> {
        if self.files.contains_key(path) {
            Some(EntryKind::File)
        } else if self.directories.contains(path) {
            Some(EntryKind::Directory)
        } else {
            None
        }
    }

    fn insert_directory_chain(&mut self, dir: &Path) -> StoreResult<()> {
        let chain: Vec<&Path> = dir
            .ancestors()
            .filter(|ancestor| !ancestor.as_os_str().is_empty())
            .collect();
        if let Some(blocker) = chain.iter().find(|p| self.files.contains_key(**p)) {
            return Err(StoreError::NotADirectory(blocker.to_path_buf()));
        }
        for ancestor in chain {
            self.directories.insert(ancestor.to_path_buf());
        }
        Ok(())
    }
}

/// Thread-safe in-memory `FileStore`.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes a file as an external actor would, creating parent directories.
    pub fn insert_file(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref();
        let mut state = self.state();
        if let Some(parent) = path.parent() {
            let _ = state.insert_directory_chain(parent);
        }
        state.files.insert(path.to_path_buf(), content.into());
    }

    /// Removes a file as an external actor would.
    pub fn remove_file(&self, path: impl AsRef<Path>) -> bool {
        self.state().files.remove(path.as_ref()).is_some()
    }

    /// Current content of `path`, bypassing handles.
    pub fn file_content(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state().files.get(path.as_ref()).cloned()
    }

    /// Number of files currently stored.
    pub fn file_count(&self) -> usize {
        self.state().files.len()
    }

    /// Number of `list_directory` calls served so far.
    pub fn list_calls(&self) -> usize {
        self.state().list_calls
    }

    /// Makes every subsequent read of `path` fail with an I/O error.
    pub fn fail_reads_for(&self, path: impl AsRef<Path>) {
        self.state().unreadable.insert(path.as_ref().to_path_buf());
    }
}

impl FileStore for MemoryFileStore {
    type Handle = MemoryHandle;

    fn list_directory(&self, dir: &Path) -> StoreResult<Vec<StoreEntry<MemoryHandle>>> {
        let mut state = self.state();
        state.list_calls += 1;
        match state.kind_of(dir) {
            None => return Err(StoreError::NotFound(dir.to_path_buf())),
            Some(EntryKind::File) => return Err(StoreError::NotADirectory(dir.to_path_buf())),
            Some(EntryKind::Directory) => {}
        }

        let files = state
            .files
            .keys()
            .map(|path| (path, EntryKind::File));
        let directories = state
            .directories
            .iter()
            .map(|path| (path, EntryKind::Directory));
        let entries = files
            .chain(directories)
            .filter(|(path, _)| path.parent() == Some(dir))
            .filter_map(|(path, kind)| {
                let name = path.file_name()?.to_str()?.to_string();
                Some(StoreEntry {
                    name,
                    kind,
                    handle: MemoryHandle(path.clone()),
                })
            })
            .collect();
        Ok(entries)
    }

    fn create_directory(&self, dir: &Path) -> StoreResult<()> {
        self.state().insert_directory_chain(dir)
    }

    fn entry_kind(&self, path: &Path) -> StoreResult<Option<EntryKind>> {
        Ok(self.state().kind_of(path))
    }

    fn create_file(&self, path: &Path, content: &str) -> StoreResult<MemoryHandle> {
        let mut state = self.state();
        if state.kind_of(path).is_some() {
            return Err(StoreError::AlreadyExists(path.to_path_buf()));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if state.kind_of(parent) != Some(EntryKind::Directory) {
                return Err(StoreError::NotFound(parent.to_path_buf()));
            }
        }
        state.files.insert(path.to_path_buf(), content.to_string());
        Ok(MemoryHandle(path.to_path_buf()))
    }

    fn read_file(&self, handle: &MemoryHandle) -> StoreResult<String> {
        let state = self.state();
        if state.unreadable.contains(&handle.0) {
            return Err(StoreError::Io {
                path: handle.0.clone(),
                source: io::Error::other("read failure injected by MemoryFileStore"),
            });
        }
        state
            .files
            .get(&handle.0)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(handle.0.clone()))
    }

    fn write_file(&self, handle: &MemoryHandle, content: &str) -> StoreResult<()> {
        let mut state = self.state();
        match state.files.get_mut(&handle.0) {
            Some(existing) => {
                *existing = content.to_string();
                Ok(())
            }
            None => Err(StoreError::NotFound(handle.0.clone())),
        }
    }

    fn delete_file(&self, handle: &MemoryHandle) -> StoreResult<()> {
        self.state()
            .files
            .remove(&handle.0)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(handle.0.clone()))
    }

    fn handle_exists(&self, handle: &MemoryHandle) -> bool {
        self.state().files.contains_key(&handle.0)
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryFileStore;
    use crate::repo::file_store::{EntryKind, FileStore, StoreError};
    use std::path::Path;

    #[test]
    fn clones_share_state() {
        let store = MemoryFileStore::new();
        let other = store.clone();
        store.insert_file("daily/2026-01-15.md", "hello");
        assert_eq!(
            other.file_content("daily/2026-01-15.md").as_deref(),
            Some("hello")
        );
        assert_eq!(
            other.entry_kind(Path::new("daily")).unwrap(),
            Some(EntryKind::Directory)
        );
    }

    #[test]
    fn create_file_requires_parent_directory() {
        let store = MemoryFileStore::new();
        assert!(matches!(
            store.create_file(Path::new("daily/2026-01-15.md"), ""),
            Err(StoreError::NotFound(_))
        ));
        store.create_directory(Path::new("daily")).unwrap();
        store
            .create_file(Path::new("daily/2026-01-15.md"), "")
            .unwrap();
        assert!(matches!(
            store.create_file(Path::new("daily/2026-01-15.md"), ""),
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[test]
    fn list_directory_counts_calls_and_lists_direct_children_only() {
        let store = MemoryFileStore::new();
        store.insert_file("daily/2026-01-15.md", "");
        store.insert_file("daily/nested/2026-01-14.md", "");
        store.insert_file("other/2026-01-13.md", "");

        let entries = store.list_directory(Path::new("daily")).unwrap();
        let mut names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, ["2026-01-15.md", "nested"]);
        assert_eq!(store.list_calls(), 1);
    }

    #[test]
    fn directory_cannot_shadow_file() {
        let store = MemoryFileStore::new();
        store.insert_file("daily", "i am a file");
        assert!(matches!(
            store.create_directory(Path::new("daily")),
            Err(StoreError::NotADirectory(_))
        ));
        assert!(matches!(
            store.list_directory(Path::new("daily")),
            Err(StoreError::NotADirectory(_))
        ));
    }

    #[test]
    fn injected_read_failure_surfaces_as_io() {
        let store = MemoryFileStore::new();
        store.create_directory(Path::new("daily")).unwrap();
        let handle = store
            .create_file(Path::new("daily/2026-01-15.md"), "x")
            .unwrap();
        store.fail_reads_for("daily/2026-01-15.md");
        assert!(matches!(
            store.read_file(&handle),
            Err(StoreError::Io { .. })
        ));
    }
}
