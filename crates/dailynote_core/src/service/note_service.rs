//! Daily note lifecycle service.
//!
//! # Responsibility
//! - Provide create/read/save/delete for individual dated notes.
//! - Auto-create today's note on demand.
//! - Expose pagination and change notifications through one owner.
//!
//! # Invariants
//! - Every successful mutation leaves the note index consistent without a
//!   directory re-listing.
//! - `create` never overwrites an existing file.
//! - `save` is idempotent for the same key and content.
//! - Failures are returned as `NoteError`, never panics.
//!
//! # Concurrency
//! - Mutating APIs take `&mut self`; wrap the service in a `Mutex` when it is
//!   shared across threads.

use crate::model::date::{CalendarDate, DateParseError};
use crate::model::note::NoteRecord;
use crate::repo::file_store::{FileStore, StoreError, StoreEvent};
use crate::repo::note_index::NoteIndex;
use crate::service::page_service::{self, PageMode, PageRequest};
use crate::settings::DailyNoteSettings;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

pub type NoteResult<T> = Result<T, NoteError>;

/// Service error for daily note use-cases.
#[derive(Debug)]
pub enum NoteError {
    /// Key/filename is not a canonical calendar date.
    Validation(DateParseError),
    /// No known note for the key.
    NotFound(String),
    /// A file is already present where a note would be created.
    AlreadyExists(String),
    /// Storage directory is unusable (e.g. occupied by a file).
    Storage(StoreError),
    /// Underlying read/write/delete failure.
    Io(StoreError),
}

impl NoteError {
    /// Stable machine-readable label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::AlreadyExists(_) => "already_exists",
            Self::Storage(_) => "storage",
            Self::Io(_) => "io",
        }
    }
}

impl Display for NoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid note date: {err}"),
            Self::NotFound(key) => write!(f, "note not found: {key}"),
            Self::AlreadyExists(target) => write!(f, "note already exists: {target}"),
            Self::Storage(err) => write!(f, "storage unavailable: {err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) | Self::Io(err) => Some(err),
            Self::NotFound(_) | Self::AlreadyExists(_) => None,
        }
    }
}

impl From<DateParseError> for NoteError {
    fn from(value: DateParseError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for NoteError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(path) => Self::NotFound(path.display().to_string()),
            StoreError::AlreadyExists(path) => Self::AlreadyExists(path.display().to_string()),
            err @ StoreError::NotADirectory(_) => Self::Storage(err),
            err @ StoreError::Io { .. } => Self::Io(err),
        }
    }
}

/// Single owner of the note index for one configured directory.
pub struct NoteService<S: FileStore> {
    index: NoteIndex<S>,
    settings: DailyNoteSettings,
}

impl<S: FileStore> NoteService<S> {
    /// Creates a service; settings are normalized before use.
    pub fn new(store: S, settings: DailyNoteSettings) -> Self {
        let settings = settings.normalized();
        let index = NoteIndex::new(store, settings.storage_path());
        Self { index, settings }
    }

    /// Overrides the index freshness window.
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.index = self.index.with_freshness_window(window);
        self
    }

    pub fn settings(&self) -> &DailyNoteSettings {
        &self.settings
    }

    /// Applies new settings; a storage directory change clears the index.
    ///
    /// Returns whether the storage directory changed.
    pub fn update_settings(&mut self, settings: DailyNoteSettings) -> bool {
        self.settings = settings.normalized();
        self.index.set_directory(self.settings.storage_path())
    }

    pub fn index(&self) -> &NoteIndex<S> {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut NoteIndex<S> {
        &mut self.index
    }

    pub fn store(&self) -> &S {
        self.index.store()
    }

    /// Loads up to `count` notes on or before `cursor`, newest first.
    pub fn load_page(
        &mut self,
        count: usize,
        cursor: CalendarDate,
        mode: PageMode,
    ) -> Vec<NoteRecord<S::Handle>> {
        page_service::load_page(&mut self.index, &PageRequest::new(count, cursor, mode))
    }

    /// First page anchored at today, sized by `initial_page_size`.
    pub fn load_initial_page(&mut self) -> Vec<NoteRecord<S::Handle>> {
        let count = self.settings.initial_page_size as usize;
        self.load_page(count, CalendarDate::today(), PageMode::Initial)
    }

    /// Next page strictly older than `oldest_shown`, sized by `page_size`.
    pub fn load_older_page(&mut self, oldest_shown: &CalendarDate) -> Vec<NoteRecord<S::Handle>> {
        let Some(cursor) = oldest_shown.subtract_days(1) else {
            return Vec::new();
        };
        let count = self.settings.page_size as usize;
        self.load_page(count, cursor, PageMode::Append)
    }

    /// Returns today's note, creating an empty one when missing.
    pub fn get_or_create_today(&mut self) -> NoteResult<NoteRecord<S::Handle>> {
        self.get_or_create(CalendarDate::today())
    }

    /// Returns the note for `date`, creating an empty one when missing.
    pub fn get_or_create(&mut self, date: CalendarDate) -> NoteResult<NoteRecord<S::Handle>> {
        let key = date.to_key();
        if self.index.note_exists(&key) {
            if let Some(record) = self.load_single(date) {
                return Ok(record);
            }
        }

        match self.create(&key, "") {
            Ok(handle) => Ok(NoteRecord::materialized(date, String::new(), handle)),
            Err(NoteError::AlreadyExists(_)) => {
                // Created externally after the last listing.
                self.index.scan(true);
                self.load_single(date)
                    .ok_or_else(|| NoteError::NotFound(key))
            }
            Err(err) => Err(err),
        }
    }

    /// Creates a new note file and registers it in the index.
    ///
    /// # Errors
    /// - `Validation` for non-canonical keys.
    /// - `AlreadyExists` when a file is present at the note path.
    /// - `Storage` when the storage directory cannot be used.
    pub fn create(&mut self, key: &str, content: &str) -> NoteResult<S::Handle> {
        let date = CalendarDate::parse(key)?;
        let key = date.to_key();
        let path = self.index.note_path(&date);
        if self.index.store().file_exists(&path) {
            warn!(
                "event=note_create module=note status=error error_code=already_exists key={}",
                key
            );
            return Err(NoteError::AlreadyExists(key));
        }

        self.index.ensure_directory()?;
        let handle = self
            .index
            .store()
            .create_file(&path, content)
            .map_err(|err| match err {
                StoreError::AlreadyExists(_) => NoteError::AlreadyExists(key.clone()),
                other => NoteError::from(other),
            })?;
        self.index.register_handle(&key, handle.clone());
        info!(
            "event=note_create module=note status=ok key={} bytes={}",
            key,
            content.len()
        );
        Ok(handle)
    }

    /// Writes `content` for `key`, creating the note when needed.
    ///
    /// A cached handle whose file disappeared externally is dropped and the
    /// note is re-created.
    pub fn save(&mut self, key: &str, content: &str) -> NoteResult<S::Handle> {
        let date = CalendarDate::parse(key)?;
        let key = date.to_key();
        let Some(handle) = self.resolve_handle(&key) else {
            return self.create(&key, content);
        };

        if !self.index.store().handle_exists(&handle) {
            warn!(
                "event=note_save module=note status=skip reason=stale_handle key={}",
                key
            );
            self.index.remove_handle(&key);
            return self.create(&key, content);
        }

        self.index.store().write_file(&handle, content)?;
        info!(
            "event=note_save module=note status=ok key={} bytes={}",
            key,
            content.len()
        );
        Ok(handle)
    }

    /// Saves a dirty record and clears its dirty flag.
    ///
    /// Clean records are left untouched.
    pub fn save_record(&mut self, record: &mut NoteRecord<S::Handle>) -> NoteResult<()> {
        if !record.dirty {
            return Ok(());
        }
        let handle = self.save(&record.key, &record.content)?;
        record.handle = Some(handle);
        record.exists = true;
        record.dirty = false;
        Ok(())
    }

    /// Deletes the note file for `key` and drops it from the index.
    ///
    /// # Errors
    /// - `NotFound` when no note is known for `key`.
    pub fn delete(&mut self, key: &str) -> NoteResult<()> {
        let date = CalendarDate::parse(key)?;
        let key = date.to_key();
        let Some(handle) = self.resolve_handle(&key) else {
            return Err(NoteError::NotFound(key));
        };

        match self.index.store().delete_file(&handle) {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => {
                warn!(
                    "event=note_delete module=note status=skip reason=already_gone key={}",
                    key
                );
            }
            Err(err) => return Err(NoteError::from(err)),
        }
        self.index.remove_handle(&key);
        info!("event=note_delete module=note status=ok key={}", key);
        Ok(())
    }

    /// Reads note content directly through the cached handle.
    ///
    /// Returns `None` for unknown keys and unreadable files.
    pub fn read(&mut self, key: &str) -> Option<String> {
        let date = CalendarDate::parse(key).ok()?;
        let key = date.to_key();
        let handle = self.resolve_handle(&key)?;
        match self.index.store().read_file(&handle) {
            Ok(content) => Some(content),
            Err(err) => {
                warn!(
                    "event=note_read module=note status=error key={} error={}",
                    key, err
                );
                None
            }
        }
    }

    /// Whether a note exists for `key`; invalid keys never exist.
    pub fn note_exists(&mut self, key: &str) -> bool {
        match CalendarDate::parse(key) {
            Ok(date) => self.index.note_exists(&date.to_key()),
            Err(_) => false,
        }
    }

    /// Host notification that something changed at `path`.
    pub fn on_directory_changed(&mut self, path: &Path) -> bool {
        self.index.on_directory_changed(path)
    }

    /// Host notification for a create/delete/rename event.
    pub fn apply_event(&mut self, event: &StoreEvent) -> bool {
        self.index.apply_event(event)
    }

    /// Cached handle for `key`, warming a stale cache once on a miss.
    fn resolve_handle(&mut self, key: &str) -> Option<S::Handle> {
        if let Some(handle) = self.index.get_handle(key) {
            return Some(handle.clone());
        }
        if self.index.is_fresh() {
            return None;
        }
        self.index.scan(false);
        self.index.get_handle(key).cloned()
    }

    fn load_single(&mut self, date: CalendarDate) -> Option<NoteRecord<S::Handle>> {
        self.load_page(1, date, PageMode::Initial)
            .into_iter()
            .next()
            .filter(|record| record.date == date)
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteError, NoteService};
    use crate::model::date::CalendarDate;
    use crate::repo::file_store::StoreError;
    use crate::repo::memory_store::MemoryFileStore;
    use crate::settings::DailyNoteSettings;
    use std::path::PathBuf;

    fn service() -> (MemoryFileStore, NoteService<MemoryFileStore>) {
        let store = MemoryFileStore::new();
        let service = NoteService::new(store.clone(), DailyNoteSettings::default());
        (store, service)
    }

    #[test]
    fn error_kinds_are_stable() {
        let storage = NoteError::from(StoreError::NotADirectory(PathBuf::from("x")));
        assert_eq!(storage.kind(), "storage");
        let missing = NoteError::from(StoreError::NotFound(PathBuf::from("x")));
        assert_eq!(missing.kind(), "not_found");
        let invalid = NoteError::from(CalendarDate::parse("2026-02-30").unwrap_err());
        assert_eq!(invalid.kind(), "validation");
    }

    #[test]
    fn get_or_create_today_on_empty_store_creates_file_without_relisting() {
        let (store, mut service) = service();
        let record = service.get_or_create_today().unwrap();
        let today = CalendarDate::today();

        assert_eq!(record.date, today);
        assert!(record.exists && !record.dirty && record.handle.is_some());
        assert!(record.content.is_empty());
        let path = format!("daily-notes/{}", today.to_filename());
        assert_eq!(store.file_content(&path).as_deref(), Some(""));

        let listings = store.list_calls();
        assert_eq!(service.index_mut().scan(false), vec![today.to_key()]);
        assert_eq!(store.list_calls(), listings);
    }

    #[test]
    fn get_or_create_returns_existing_content() {
        let (store, mut service) = service();
        store.insert_file("daily-notes/2026-01-15.md", "already here");
        let date = CalendarDate::new(2026, 1, 15).unwrap();
        let record = service.get_or_create(date).unwrap();
        assert_eq!(record.content, "already here");
        assert_eq!(store.file_count(), 1);
    }

    #[test]
    fn get_or_create_recovers_from_file_created_after_listing() {
        let (store, mut service) = service();
        service.index_mut().scan(true);
        store.insert_file("daily-notes/2026-01-15.md", "external");

        let date = CalendarDate::new(2026, 1, 15).unwrap();
        let record = service.get_or_create(date).unwrap();
        assert_eq!(record.content, "external");
    }

    #[test]
    fn create_rejects_invalid_keys_and_collisions() {
        let (store, mut service) = service();
        assert!(matches!(
            service.create("2026-13-01", "x"),
            Err(NoteError::Validation(_))
        ));

        store.insert_file("daily-notes/2026-01-15.md", "keep");
        assert!(matches!(
            service.create("2026-01-15", "overwrite"),
            Err(NoteError::AlreadyExists(_))
        ));
        assert_eq!(
            store.file_content("daily-notes/2026-01-15.md").as_deref(),
            Some("keep")
        );
    }

    #[test]
    fn create_fails_with_storage_error_when_directory_is_a_file() {
        let (store, mut service) = service();
        store.insert_file("daily-notes", "not a folder");
        let err = service.create("2026-01-15", "x").unwrap_err();
        assert!(matches!(err, NoteError::Storage(_)), "{err}");
    }

    #[test]
    fn save_recreates_externally_deleted_note() {
        let (store, mut service) = service();
        service.save("2026-01-20", "v1").unwrap();
        assert!(store.remove_file("daily-notes/2026-01-20.md"));

        service.save("2026-01-20", "v2").unwrap();
        assert_eq!(
            store.file_content("daily-notes/2026-01-20.md").as_deref(),
            Some("v2")
        );
    }

    #[test]
    fn save_with_cold_cache_updates_existing_file() {
        let (store, mut service) = service();
        store.insert_file("daily-notes/2026-01-20.md", "on disk");
        service.save("2026-01-20", "edited").unwrap();
        assert_eq!(
            store.file_content("daily-notes/2026-01-20.md").as_deref(),
            Some("edited")
        );
    }

    #[test]
    fn save_record_clears_dirty_flag() {
        let (store, mut service) = service();
        let date = CalendarDate::new(2026, 1, 20).unwrap();
        let mut record = service.get_or_create(date).unwrap();
        record.edit("typed text");
        assert!(record.dirty);

        service.save_record(&mut record).unwrap();
        assert!(!record.dirty);
        assert_eq!(
            store.file_content("daily-notes/2026-01-20.md").as_deref(),
            Some("typed text")
        );
    }

    #[test]
    fn delete_unknown_note_is_not_found() {
        let (_, mut service) = service();
        assert!(matches!(
            service.delete("2026-01-20"),
            Err(NoteError::NotFound(_))
        ));
    }

    #[test]
    fn delete_tolerates_file_already_removed_externally() {
        let (store, mut service) = service();
        service.save("2026-01-20", "x").unwrap();
        store.remove_file("daily-notes/2026-01-20.md");
        service.delete("2026-01-20").unwrap();
        assert!(!service.note_exists("2026-01-20"));
    }

    #[test]
    fn read_returns_content_and_none_for_unknown_or_invalid() {
        let (store, mut service) = service();
        store.insert_file("daily-notes/2026-01-15.md", "body");
        assert_eq!(service.read("2026-01-15").as_deref(), Some("body"));
        assert_eq!(service.read("2026-01-16"), None);
        assert_eq!(service.read("garbage"), None);
    }

    #[test]
    fn update_settings_retargets_directory() {
        let (store, mut service) = service();
        store.insert_file("daily-notes/2026-01-15.md", "");
        store.insert_file("journal/2025-12-31.md", "");
        assert!(service.note_exists("2026-01-15"));

        assert!(service.update_settings(DailyNoteSettings::new("journal")));
        assert!(!service.note_exists("2026-01-15"));
        assert!(service.note_exists("2025-12-31"));
        assert!(!service.update_settings(DailyNoteSettings::new("journal/")));
    }

    #[test]
    fn load_older_page_uses_configured_page_size() {
        let (store, mut service) = service();
        let start = CalendarDate::new(2026, 3, 31).unwrap();
        for day in CalendarDate::range(&start, 40) {
            store.insert_file(format!("daily-notes/{}", day.to_filename()), "");
        }
        let page = service.load_older_page(&start);
        assert_eq!(page.len(), 20);
        assert_eq!(page[0].key, "2026-03-30");
    }
}
