//! Date-keyed note index with time-bounded freshness.
//!
//! # Responsibility
//! - Own the canonical mapping `date key -> file handle` for one directory.
//! - Rebuild the mapping from directory listings and keep it current across
//!   incremental create/delete and external change notifications.
//!
//! # Invariants
//! - Every cached key passes `CalendarDate::parse`.
//! - The cache reflects the last successful listing, plus incremental
//!   registrations since then.
//! - A listing is trusted for `freshness_window`; `invalidate` or a forced
//!   scan always re-lists.
//! - Missing or non-directory storage paths scan as empty, not as errors.
//!
//! # Concurrency
//! - One index per storage directory. Mutating methods take `&mut self`; a
//!   multi-threaded caller must serialize access (e.g. behind a `Mutex`).

use crate::model::date::{parse_note_file_name, CalendarDate};
use crate::repo::file_store::{EntryKind, FileStore, StoreError, StoreEvent, StoreResult};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

/// Default period during which a directory listing is reused.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(5);

/// Cache of dated notes in one storage directory.
pub struct NoteIndex<S: FileStore> {
    store: S,
    directory: PathBuf,
    entries: HashMap<String, S::Handle>,
    last_scan: Option<Instant>,
    freshness_window: Duration,
}

impl<S: FileStore> NoteIndex<S> {
    /// Creates an empty, stale index over `directory`.
    pub fn new(store: S, directory: impl Into<PathBuf>) -> Self {
        Self {
            store,
            directory: without_current_dir(&directory.into()),
            entries: HashMap::new(),
            last_scan: None,
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
        }
    }

    /// Overrides the freshness window.
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Points the index at another directory, dropping all cached state.
    ///
    /// Returns `false` when `directory` is unchanged.
    pub fn set_directory(&mut self, directory: impl Into<PathBuf>) -> bool {
        let directory = without_current_dir(&directory.into());
        if directory == self.directory {
            return false;
        }
        info!(
            "event=index_retarget module=index status=ok from={} to={}",
            self.directory.display(),
            directory.display()
        );
        self.directory = directory;
        self.invalidate();
        true
    }

    /// Storage path for the note of `date`.
    pub fn note_path(&self, date: &CalendarDate) -> PathBuf {
        self.directory.join(date.to_filename())
    }

    /// Creates the storage directory when missing.
    ///
    /// # Errors
    /// - `StoreError::NotADirectory` when the path is occupied by a file.
    pub fn ensure_directory(&self) -> StoreResult<()> {
        match self.store.entry_kind(&self.directory)? {
            Some(EntryKind::Directory) => Ok(()),
            Some(EntryKind::File) => {
                warn!(
                    "event=index_ensure_dir module=index status=error error_code=not_a_directory dir={}",
                    self.directory.display()
                );
                Err(StoreError::NotADirectory(self.directory.clone()))
            }
            None => {
                self.store.create_directory(&self.directory)?;
                info!(
                    "event=index_ensure_dir module=index status=ok created=true dir={}",
                    self.directory.display()
                );
                Ok(())
            }
        }
    }

    /// Whether the last listing is still inside the freshness window.
    pub fn is_fresh(&self) -> bool {
        self.last_scan
            .is_some_and(|at| at.elapsed() < self.freshness_window)
    }

    /// Returns known date keys, newest first.
    ///
    /// Re-lists the directory when `force_refresh` is set or the cache is
    /// stale. Listing failures degrade to an empty result and leave the
    /// cache stale so the next call retries.
    pub fn scan(&mut self, force_refresh: bool) -> Vec<String> {
        if !force_refresh && self.is_fresh() {
            return self.sorted_keys();
        }

        let started_at = Instant::now();
        match self.store.list_directory(&self.directory) {
            Ok(listing) => {
                let mut rebuilt = HashMap::with_capacity(listing.len());
                for entry in listing {
                    if entry.kind != EntryKind::File {
                        continue;
                    }
                    if let Some(date) = parse_note_file_name(&entry.name) {
                        rebuilt.insert(date.to_key(), entry.handle);
                    }
                }
                self.entries = rebuilt;
            }
            Err(StoreError::NotFound(_)) => {
                // No directory yet means no notes yet.
                self.entries.clear();
            }
            Err(err) => {
                warn!(
                    "event=index_scan module=index status=error forced={} dir={} error={}",
                    force_refresh,
                    self.directory.display(),
                    err
                );
                self.entries.clear();
                self.last_scan = None;
                return Vec::new();
            }
        }

        self.last_scan = Some(Instant::now());
        debug!(
            "event=index_scan module=index status=ok forced={} count={} duration_ms={}",
            force_refresh,
            self.entries.len(),
            started_at.elapsed().as_millis()
        );
        self.sorted_keys()
    }

    /// Clears cached entries and forces the next scan to re-list.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.last_scan = None;
        debug!("event=index_invalidate module=index status=ok");
    }

    /// Whether a note exists for `key`, using a cached listing when fresh.
    pub fn note_exists(&mut self, key: &str) -> bool {
        self.scan(false);
        self.entries.contains_key(key)
    }

    pub fn get_handle(&self, key: &str) -> Option<&S::Handle> {
        self.entries.get(key)
    }

    /// Records a newly created note without re-listing.
    ///
    /// Returns `false` (and caches nothing) for invalid keys.
    pub fn register_handle(&mut self, key: &str, handle: S::Handle) -> bool {
        let canonical = CalendarDate::parse(key).is_ok_and(|date| date.to_key() == key);
        if !canonical {
            warn!("event=index_register module=index status=skip reason=invalid_key");
            return false;
        }
        self.entries.insert(key.to_string(), handle);
        true
    }

    /// Drops a cached entry without re-listing.
    pub fn remove_handle(&mut self, key: &str) -> Option<S::Handle> {
        self.entries.remove(key)
    }

    /// Number of cached entries (no scan).
    pub fn cached_len(&self) -> usize {
        self.entries.len()
    }

    /// Invalidates when `path` is the storage directory or lies under it.
    ///
    /// Returns whether the cache was invalidated.
    pub fn on_directory_changed(&mut self, path: &Path) -> bool {
        if self.covers(path) {
            self.invalidate();
            return true;
        }
        false
    }

    /// Applies an external change notification.
    pub fn apply_event(&mut self, event: &StoreEvent) -> bool {
        let relevant = event
            .paths()
            .iter()
            .any(|path| self.covers(path));
        if relevant {
            debug!("event=index_external_change module=index status=ok event={event:?}");
            self.invalidate();
        }
        relevant
    }

    fn covers(&self, path: &Path) -> bool {
        without_current_dir(path).starts_with(&self.directory)
    }

    fn sorted_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort_unstable_by(|a, b| b.cmp(a));
        keys
    }
}

/// `journal/./x` and `./journal/x` both compare as `journal/x`.
fn without_current_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::NoteIndex;
    use crate::model::date::CalendarDate;
    use crate::repo::file_store::{FileStore, StoreError, StoreEvent};
    use crate::repo::memory_store::MemoryFileStore;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    fn seeded_store() -> MemoryFileStore {
        let store = MemoryFileStore::new();
        store.insert_file("daily-notes/2026-01-15.md", "fifteen");
        store.insert_file("daily-notes/2026-01-14.md", "fourteen");
        store.insert_file("daily-notes/2026-01-10.md", "ten");
        store.insert_file("daily-notes/notes.md", "not dated");
        store
    }

    #[test]
    fn scan_filters_non_date_files_and_sorts_newest_first() {
        let mut index = NoteIndex::new(seeded_store(), "daily-notes");
        assert_eq!(
            index.scan(true),
            vec!["2026-01-15", "2026-01-14", "2026-01-10"]
        );
    }

    #[test]
    fn scan_ignores_invalid_dates_and_subdirectories() {
        let store = seeded_store();
        store.insert_file("daily-notes/2026-02-30.md", "");
        store.insert_file("daily-notes/2026-01-11.txt", "");
        store.insert_file("daily-notes/2026-01-12.md/inner.md", "");
        let mut index = NoteIndex::new(store, "daily-notes");
        assert_eq!(index.scan(true).len(), 3);
    }

    #[test]
    fn scan_reuses_listing_inside_freshness_window() {
        let store = seeded_store();
        let mut index = NoteIndex::new(store.clone(), "daily-notes");
        index.scan(false);
        index.scan(false);
        assert_eq!(store.list_calls(), 1);

        index.scan(true);
        assert_eq!(store.list_calls(), 2);
    }

    #[test]
    fn zero_window_always_relists() {
        let store = seeded_store();
        let mut index =
            NoteIndex::new(store.clone(), "daily-notes").with_freshness_window(Duration::ZERO);
        index.scan(false);
        index.scan(false);
        assert_eq!(store.list_calls(), 2);
    }

    #[test]
    fn missing_directory_scans_as_empty() {
        let mut index = NoteIndex::new(MemoryFileStore::new(), "daily-notes");
        assert!(index.scan(true).is_empty());
        assert!(index.is_fresh());
    }

    #[test]
    fn file_in_place_of_directory_scans_as_empty_and_stays_stale() {
        let store = MemoryFileStore::new();
        store.insert_file("daily-notes", "oops");
        let mut index = NoteIndex::new(store, "daily-notes");
        assert!(index.scan(false).is_empty());
        assert!(!index.is_fresh());
        assert!(matches!(
            index.ensure_directory(),
            Err(StoreError::NotADirectory(_))
        ));
    }

    #[test]
    fn ensure_directory_is_idempotent() {
        let store = MemoryFileStore::new();
        let index = NoteIndex::new(store.clone(), "vault/daily-notes");
        index.ensure_directory().unwrap();
        index.ensure_directory().unwrap();
        assert!(store.list_directory(Path::new("vault/daily-notes")).is_ok());
    }

    #[test]
    fn register_and_remove_update_cache_without_relisting() {
        let store = seeded_store();
        let mut index = NoteIndex::new(store.clone(), "daily-notes");
        index.scan(false);

        index.ensure_directory().unwrap();
        let date = CalendarDate::new(2026, 1, 20).unwrap();
        let handle = store.create_file(&index.note_path(&date), "").unwrap();
        assert!(index.register_handle("2026-01-20", handle));
        assert!(index.note_exists("2026-01-20"));

        assert!(index.remove_handle("2026-01-15").is_some());
        assert!(!index.note_exists("2026-01-15"));
        assert_eq!(store.list_calls(), 1);
    }

    #[test]
    fn register_rejects_invalid_keys() {
        let store = seeded_store();
        let mut index = NoteIndex::new(store.clone(), "daily-notes");
        let keys = index.scan(true);
        assert_eq!(keys.len(), 3);
        let existing = index.get_handle("2026-01-15").cloned().unwrap();
        assert!(!index.register_handle("2026-02-30", existing.clone()));
        assert!(!index.register_handle("2026-01-15.md", existing));
        assert_eq!(index.cached_len(), 3);
    }

    #[test]
    fn invalidate_forces_relisting() {
        let store = seeded_store();
        let mut index = NoteIndex::new(store.clone(), "daily-notes");
        index.scan(false);
        store.insert_file("daily-notes/2026-01-16.md", "external");
        assert_eq!(index.scan(false).len(), 3);

        index.invalidate();
        assert_eq!(index.cached_len(), 0);
        assert_eq!(index.scan(false)[0], "2026-01-16");
    }

    #[test]
    fn change_notifications_only_invalidate_for_paths_under_directory() {
        let store = seeded_store();
        let mut index = NoteIndex::new(store, "daily-notes");
        index.scan(false);

        assert!(!index.on_directory_changed(Path::new("elsewhere/2026-01-01.md")));
        assert!(!index.on_directory_changed(Path::new("daily-notes-archive/x.md")));
        assert!(index.is_fresh());

        assert!(index.on_directory_changed(Path::new("daily-notes/2026-01-01.md")));
        assert!(!index.is_fresh());

        index.scan(false);
        let rename_in = StoreEvent::Renamed {
            from: PathBuf::from("inbox/today.md"),
            to: PathBuf::from("daily-notes/2026-01-01.md"),
        };
        assert!(index.apply_event(&rename_in));
        assert!(!index.is_fresh());
    }

    #[test]
    fn dot_prefixed_directory_still_matches_change_notifications() {
        let store = MemoryFileStore::new();
        store.insert_file("journal/2026-01-15.md", "fifteen");
        let mut index = NoteIndex::new(store.clone(), "./journal");
        assert_eq!(index.directory(), Path::new("journal"));
        assert_eq!(index.scan(false), vec!["2026-01-15"]);

        assert!(index.on_directory_changed(Path::new("journal/2026-01-16.md")));
        assert!(!index.is_fresh());

        index.scan(false);
        assert!(index.on_directory_changed(Path::new("./journal/./2026-01-16.md")));

        store.insert_file("journal/2026-01-16.md", "sixteen");
        let created = StoreEvent::Created(PathBuf::from("journal/2026-01-16.md"));
        assert!(index.apply_event(&created));
        assert_eq!(index.scan(false), vec!["2026-01-16", "2026-01-15"]);
    }

    #[test]
    fn set_directory_clears_cache() {
        let store = seeded_store();
        store.insert_file("journal/2025-12-31.md", "");
        let mut index = NoteIndex::new(store, "daily-notes");
        assert_eq!(index.scan(false).len(), 3);

        assert!(!index.set_directory("daily-notes"));
        assert!(index.set_directory("journal"));
        assert_eq!(index.cached_len(), 0);
        assert_eq!(index.scan(false), vec!["2025-12-31"]);
    }
}
