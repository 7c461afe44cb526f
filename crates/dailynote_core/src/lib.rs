//! Core domain logic for daily notes.
//! This crate is the single source of truth for the date-indexed note store,
//! its cache, and incremental pagination.

pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod settings;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::date::{
    is_valid_date_key, ordinal_suffix, parse_note_file_name, CalendarDate, DateDisplay,
    DateParseError,
};
pub use model::note::{strip_date_heading, NoteRecord};
pub use repo::file_store::{
    EntryKind, FileStore, StoreEntry, StoreError, StoreEvent, StoreResult,
};
pub use repo::local_store::{LocalFileStore, LocalHandle};
pub use repo::memory_store::{MemoryFileStore, MemoryHandle};
pub use repo::note_index::{NoteIndex, DEFAULT_FRESHNESS_WINDOW};
pub use service::note_service::{NoteError, NoteResult, NoteService};
pub use service::page_service::{
    load_page, older_cursor, page_is_exhausted, select_page_keys, PageMode, PageRequest,
};
pub use settings::{DailyNoteSettings, SettingsError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
