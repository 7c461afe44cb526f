//! Local file-system store.
//!
//! # Responsibility
//! - Implement `FileStore` over `std::fs` rooted at a vault directory.
//!
//! # Invariants
//! - Relative paths resolve against the vault root; handles keep the
//!   relative form so they stay valid if the root is moved as a whole.
//! - `create_file` uses `create_new` and never truncates an existing file.

use crate::repo::file_store::{EntryKind, FileStore, StoreEntry, StoreError, StoreResult};
use log::{debug, warn};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Handle for a file managed by `LocalFileStore`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalHandle {
    path: PathBuf,
}

impl LocalHandle {
    /// Path as given to the store (usually relative to the vault root).
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `std::fs`-backed store for desktop/CLI use.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute (or root-joined) location of `path`.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl FileStore for LocalFileStore {
    type Handle = LocalHandle;

    fn list_directory(&self, dir: &Path) -> StoreResult<Vec<StoreEntry<LocalHandle>>> {
        let resolved = self.resolve(dir);
        if resolved.is_file() {
            return Err(StoreError::NotADirectory(dir.to_path_buf()));
        }

        let reader = fs::read_dir(&resolved).map_err(|err| StoreError::from_io(dir, err))?;
        let mut entries = Vec::new();
        for entry in reader {
            let entry = entry.map_err(|err| StoreError::from_io(dir, err))?;
            let Ok(name) = entry.file_name().into_string() else {
                debug!(
                    "event=store_list module=store status=skip reason=non_utf8_name dir={}",
                    dir.display()
                );
                continue;
            };
            let file_type = entry
                .file_type()
                .map_err(|err| StoreError::from_io(dir.join(&name), err))?;
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            entries.push(StoreEntry {
                handle: LocalHandle {
                    path: dir.join(&name),
                },
                name,
                kind,
            });
        }
        Ok(entries)
    }

    fn create_directory(&self, dir: &Path) -> StoreResult<()> {
        let resolved = self.resolve(dir);
        if resolved.is_file() {
            return Err(StoreError::NotADirectory(dir.to_path_buf()));
        }
        fs::create_dir_all(&resolved).map_err(|err| StoreError::from_io(dir, err))
    }

    fn entry_kind(&self, path: &Path) -> StoreResult<Option<EntryKind>> {
        match fs::metadata(self.resolve(path)) {
            Ok(meta) if meta.is_dir() => Ok(Some(EntryKind::Directory)),
            Ok(_) => Ok(Some(EntryKind::File)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::from_io(path, err)),
        }
    }

    fn create_file(&self, path: &Path, content: &str) -> StoreResult<LocalHandle> {
        let resolved = self.resolve(path);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&resolved)
            .map_err(|err| StoreError::from_io(path, err))?;
        fill_new_file(file, &resolved, content).map_err(|err| StoreError::from_io(path, err))?;
        Ok(LocalHandle {
            path: path.to_path_buf(),
        })
    }

    fn read_file(&self, handle: &LocalHandle) -> StoreResult<String> {
        fs::read_to_string(self.resolve(&handle.path))
            .map_err(|err| StoreError::from_io(&handle.path, err))
    }

    fn write_file(&self, handle: &LocalHandle, content: &str) -> StoreResult<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(self.resolve(&handle.path))
            .map_err(|err| StoreError::from_io(&handle.path, err))?;
        file.write_all(content.as_bytes())
            .map_err(|err| StoreError::from_io(&handle.path, err))
    }

    fn delete_file(&self, handle: &LocalHandle) -> StoreResult<()> {
        fs::remove_file(self.resolve(&handle.path))
            .map_err(|err| StoreError::from_io(&handle.path, err))
    }

    fn handle_exists(&self, handle: &LocalHandle) -> bool {
        self.resolve(&handle.path).is_file()
    }
}

/// Writes `content` into a freshly created file, removing it on failure so
/// a half-written note never shows up in listings.
fn fill_new_file(mut writer: impl Write, resolved: &Path, content: &str) -> io::Result<()> {
    let Err(err) = writer.write_all(content.as_bytes()) else {
        return Ok(());
    };
    drop(writer);
    if let Err(cleanup) = fs::remove_file(resolved) {
        warn!(
            "event=store_create_cleanup module=store status=error path={} error={}",
            resolved.display(),
            cleanup
        );
    }
    Err(err)
}
