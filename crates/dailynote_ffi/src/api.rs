//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose daily-note paging and lifecycle calls to Dart via FRB.
//! - Flatten core results into plain envelopes (`ok` + `message`).
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - One process-wide service per configured vault, guarded by a mutex so
//!   index read-modify-write sequences never interleave.
//! - Every call except `daily_configure` fails softly until configured.

use dailynote_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, page_is_exhausted,
    ping as ping_inner, CalendarDate, DailyNoteSettings, DateDisplay, LocalFileStore, LocalHandle,
    NoteError, NoteRecord, NoteService, PageMode,
};
use log::warn;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

static DAILY_SERVICE: Mutex<Option<NoteService<LocalFileStore>>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One note as shown in the scrolling view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyNoteItem {
    /// Canonical `YYYY-MM-DD` key.
    pub date_key: String,
    /// Long display title, e.g. `January 15th, 2026`.
    pub title: String,
    /// Raw markdown content.
    pub content: String,
    /// Content without the optional leading date heading.
    pub body: String,
    pub exists: bool,
}

/// Page envelope for paging calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyPageResponse {
    /// Notes, newest first.
    pub items: Vec<DailyNoteItem>,
    /// Requested page size.
    pub requested: u32,
    /// `true` when fewer items than requested came back.
    pub exhausted: bool,
    pub message: String,
}

impl DailyPageResponse {
    fn failure(requested: u32, message: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            requested,
            exhausted: false,
            message: message.into(),
        }
    }
}

/// Tagged result for mutating calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyActionResponse {
    pub ok: bool,
    /// Affected note key when known.
    pub date_key: Option<String>,
    /// `validation|not_found|already_exists|storage|io` on failure.
    pub error_kind: Option<String>,
    pub message: String,
}

impl DailyActionResponse {
    fn success(message: impl Into<String>, date_key: Option<String>) -> Self {
        Self {
            ok: true,
            date_key,
            error_kind: None,
            message: message.into(),
        }
    }

    fn failure(kind: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            date_key: None,
            error_kind: Some(kind.to_string()),
            message: message.into(),
        }
    }

    fn from_note_error(op: &str, err: &NoteError) -> Self {
        Self::failure(err.kind(), format!("{op} failed: {err}"))
    }
}

/// Response for today's note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTodayResponse {
    pub ok: bool,
    pub item: Option<DailyNoteItem>,
    pub message: String,
}

/// Points the process-wide service at a vault.
///
/// Input semantics:
/// - `vault_root`: directory that contains the storage directory.
/// - `settings_toml`: optional `daily-notes.toml` content; `None` = defaults.
///
/// Reconfiguring to a different storage directory clears the note index.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_configure(vault_root: String, settings_toml: Option<String>) -> DailyActionResponse {
    let root = vault_root.trim();
    if root.is_empty() {
        return DailyActionResponse::failure("storage", "vault_root cannot be empty");
    }
    let settings = match settings_toml.as_deref() {
        Some(text) => match DailyNoteSettings::from_toml(text) {
            Ok(settings) => settings,
            Err(err) => {
                return DailyActionResponse::failure(
                    "validation",
                    format!("daily_configure failed: {err}"),
                )
            }
        },
        None => DailyNoteSettings::default(),
    };

    let mut guard = DAILY_SERVICE
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    let same_root = guard
        .as_ref()
        .is_some_and(|service| service.store().root() == Path::new(root));
    match guard.as_mut() {
        Some(service) if same_root => {
            service.update_settings(settings);
        }
        _ => {
            *guard = Some(NoteService::new(LocalFileStore::new(root), settings));
        }
    }
    DailyActionResponse::success("Configured.", None)
}

/// Loads one page on or before `cursor` (`""` = today).
#[flutter_rust_bridge::frb(sync)]
pub fn daily_load_page(count: u32, cursor: String, append: bool) -> DailyPageResponse {
    let cursor = match parse_cursor(&cursor) {
        Ok(cursor) => cursor,
        Err(message) => return DailyPageResponse::failure(count, message),
    };
    let mode = if append {
        PageMode::Append
    } else {
        PageMode::Initial
    };
    match with_service(|service| service.load_page(count as usize, cursor, mode)) {
        Ok(records) => to_page_response(records, count),
        Err(message) => DailyPageResponse::failure(count, message),
    }
}

/// Loads the first page using the configured `initial_page_size`.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_load_initial() -> DailyPageResponse {
    match with_service(|service| {
        let requested = service.settings().initial_page_size;
        (service.load_initial_page(), requested)
    }) {
        Ok((records, requested)) => to_page_response(records, requested),
        Err(message) => DailyPageResponse::failure(0, message),
    }
}

/// Loads the page strictly older than `oldest_shown`.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_load_older(oldest_shown: String) -> DailyPageResponse {
    let oldest = match CalendarDate::parse(oldest_shown.trim()) {
        Ok(date) => date,
        Err(err) => return DailyPageResponse::failure(0, format!("daily_load_older failed: {err}")),
    };
    match with_service(|service| {
        let requested = service.settings().page_size;
        (service.load_older_page(&oldest), requested)
    }) {
        Ok((records, requested)) => to_page_response(records, requested),
        Err(message) => DailyPageResponse::failure(0, message),
    }
}

/// Returns today's note, creating it when missing.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_today() -> DailyTodayResponse {
    match with_service(|service| service.get_or_create_today()) {
        Ok(Ok(record)) => DailyTodayResponse {
            ok: true,
            item: Some(to_item(&record)),
            message: String::new(),
        },
        Ok(Err(err)) => DailyTodayResponse {
            ok: false,
            item: None,
            message: format!("daily_today failed: {err}"),
        },
        Err(message) => DailyTodayResponse {
            ok: false,
            item: None,
            message,
        },
    }
}

/// Saves full note content, creating the note when needed.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_save(date_key: String, content: String) -> DailyActionResponse {
    let key = date_key.trim().to_string();
    match with_service(|service| service.save(&key, &content)) {
        Ok(Ok(_)) => DailyActionResponse::success("Saved.", Some(key)),
        Ok(Err(err)) => DailyActionResponse::from_note_error("daily_save", &err),
        Err(message) => DailyActionResponse::failure("storage", message),
    }
}

/// Deletes one note.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_delete(date_key: String) -> DailyActionResponse {
    let key = date_key.trim().to_string();
    match with_service(|service| service.delete(&key)) {
        Ok(Ok(())) => DailyActionResponse::success("Deleted.", Some(key)),
        Ok(Err(err)) => DailyActionResponse::from_note_error("daily_delete", &err),
        Err(message) => DailyActionResponse::failure("storage", message),
    }
}

/// Reads note content; `None` when unknown, unreadable, or unconfigured.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_read(date_key: String) -> Option<String> {
    with_service(|service| service.read(date_key.trim())).ok().flatten()
}

#[flutter_rust_bridge::frb(sync)]
pub fn daily_note_exists(date_key: String) -> bool {
    with_service(|service| service.note_exists(date_key.trim())).unwrap_or(false)
}

/// Forwards a host file-system change; returns whether the index was reset.
///
/// Accepts paths relative to the vault root or absolute paths inside it.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_on_directory_changed(path: String) -> bool {
    with_service(|service| {
        let raw = PathBuf::from(path.trim());
        let relative = raw
            .strip_prefix(service.store().root())
            .map(Path::to_path_buf)
            .unwrap_or(raw);
        service.on_directory_changed(&relative)
    })
    .unwrap_or(false)
}

fn with_service<T>(f: impl FnOnce(&mut NoteService<LocalFileStore>) -> T) -> Result<T, String> {
    let mut guard = DAILY_SERVICE
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    match guard.as_mut() {
        Some(service) => Ok(f(service)),
        None => {
            warn!("event=ffi_call module=ffi status=error error_code=not_configured");
            Err("daily notes not configured; call daily_configure first".to_string())
        }
    }
}

fn parse_cursor(raw: &str) -> Result<CalendarDate, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(CalendarDate::today());
    }
    CalendarDate::parse(trimmed).map_err(|err| format!("invalid cursor: {err}"))
}

fn to_page_response(records: Vec<NoteRecord<LocalHandle>>, requested: u32) -> DailyPageResponse {
    let items: Vec<DailyNoteItem> = records.iter().map(to_item).collect();
    let exhausted = page_is_exhausted(items.len(), requested as usize);
    let message = if items.is_empty() {
        "No notes.".to_string()
    } else {
        format!("Loaded {} note(s).", items.len())
    };
    DailyPageResponse {
        items,
        requested,
        exhausted,
        message,
    }
}

fn to_item(record: &NoteRecord<LocalHandle>) -> DailyNoteItem {
    DailyNoteItem {
        date_key: record.key.clone(),
        title: record.date.to_display(DateDisplay::Long),
        content: record.content.clone(),
        body: record.body().to_string(),
        exists: record.exists,
    }
}
