//! File store adapter contract.
//!
//! # Responsibility
//! - Abstract directory listing and per-file CRUD for the note core.
//! - Keep host-specific file handles opaque to everything above this layer.
//!
//! # Invariants
//! - Core code never inspects `Handle` internals; it only passes handles back.
//! - `create_file` never overwrites; `write_file` never creates.
//! - Missing targets surface as `StoreError::NotFound`, not generic I/O.

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

pub type StoreResult<T> = Result<T, StoreError>;

/// Adapter-level storage failure.
#[derive(Debug)]
pub enum StoreError {
    /// Target path does not exist.
    NotFound(PathBuf),
    /// Create collided with an existing entry.
    AlreadyExists(PathBuf),
    /// Path exists but is not a directory.
    NotADirectory(PathBuf),
    /// Underlying read/write/delete failure.
    Io { path: PathBuf, source: io::Error },
}

impl StoreError {
    /// Maps an `io::Error` to the semantic variants where possible.
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(path),
            _ => Self::Io { path, source },
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "path not found: {}", path.display()),
            Self::AlreadyExists(path) => write!(f, "path already exists: {}", path.display()),
            Self::NotADirectory(path) => {
                write!(f, "path exists but is not a directory: {}", path.display())
            }
            Self::Io { path, source } => write!(f, "I/O failure at {}: {source}", path.display()),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One item returned by `FileStore::list_directory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry<H> {
    /// Bare file name (no directory component).
    pub name: String,
    pub kind: EntryKind,
    /// Handle usable with the read/write/delete operations.
    pub handle: H,
}

/// Storage backend consumed by the note core.
///
/// Paths are interpreted by the implementation (e.g. relative to a vault
/// root). All operations are synchronous and fail fast; retries are a caller
/// concern.
pub trait FileStore {
    /// Opaque file reference.
    type Handle: Clone + Debug + PartialEq;

    /// Lists direct children of `dir`.
    ///
    /// Returns `NotFound` when `dir` is missing and `NotADirectory` when it is
    /// a file.
    fn list_directory(&self, dir: &Path) -> StoreResult<Vec<StoreEntry<Self::Handle>>>;

    /// Creates `dir` and any missing parents.
    fn create_directory(&self, dir: &Path) -> StoreResult<()>;

    /// Returns the kind of entry at `path`, or `None` when absent.
    fn entry_kind(&self, path: &Path) -> StoreResult<Option<EntryKind>>;

    /// Returns whether a regular file exists at `path`.
    fn file_exists(&self, path: &Path) -> bool {
        matches!(self.entry_kind(path), Ok(Some(EntryKind::File)))
    }

    /// Creates a new file with `content`; fails with `AlreadyExists` on collision.
    fn create_file(&self, path: &Path, content: &str) -> StoreResult<Self::Handle>;

    fn read_file(&self, handle: &Self::Handle) -> StoreResult<String>;

    /// Replaces the content of an existing file.
    fn write_file(&self, handle: &Self::Handle, content: &str) -> StoreResult<()>;

    fn delete_file(&self, handle: &Self::Handle) -> StoreResult<()>;

    /// Returns whether the handle's target is still present.
    fn handle_exists(&self, handle: &Self::Handle) -> bool;
}

/// External change notification forwarded by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Created(PathBuf),
    Deleted(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
}

impl StoreEvent {
    /// Paths touched by the event.
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            Self::Created(path) | Self::Deleted(path) => vec![path.as_path()],
            Self::Renamed { from, to } => vec![from.as_path(), to.as_path()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{StoreError, StoreEvent};
    use std::io;
    use std::path::{Path, PathBuf};

    #[test]
    fn from_io_maps_semantic_kinds() {
        let not_found = StoreError::from_io("a", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(not_found, StoreError::NotFound(_)));

        let exists = StoreError::from_io("a", io::Error::from(io::ErrorKind::AlreadyExists));
        assert!(matches!(exists, StoreError::AlreadyExists(_)));

        let other = StoreError::from_io("a", io::Error::other("disk on fire"));
        assert!(matches!(other, StoreError::Io { .. }));
        assert!(other.to_string().contains("disk on fire"));
    }

    #[test]
    fn rename_event_reports_both_paths() {
        let event = StoreEvent::Renamed {
            from: PathBuf::from("daily-notes/2026-01-01.md"),
            to: PathBuf::from("archive/2026-01-01.md"),
        };
        assert_eq!(
            event.paths(),
            vec![
                Path::new("daily-notes/2026-01-01.md"),
                Path::new("archive/2026-01-01.md")
            ]
        );
    }
}
