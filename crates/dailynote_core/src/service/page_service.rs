//! Cursor-based pagination over the note index.
//!
//! # Responsibility
//! - Select the newest `count` notes on or before a cursor date.
//! - Read note content for the selected slice with per-entry isolation.
//!
//! # Invariants
//! - Pages are ordered newest first and never longer than `count`.
//! - One unreadable note yields an empty-content record; the page survives.
//! - There is no end-of-data marker: a page shorter than requested means the
//!   history is exhausted, while a full page may or may not be the last one.

use crate::model::date::CalendarDate;
use crate::model::note::NoteRecord;
use crate::repo::file_store::FileStore;
use crate::repo::note_index::NoteIndex;
use log::{debug, warn};
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Why a page is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// First load, typically anchored at today.
    Initial,
    /// Continuation below the oldest note already shown.
    Append,
}

impl Display for PageMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::Append => write!(f, "append"),
        }
    }
}

/// Page request envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum number of notes; `0` yields an empty page.
    pub count: usize,
    /// Newest date eligible for this page (inclusive).
    pub cursor: CalendarDate,
    pub mode: PageMode,
}

impl PageRequest {
    pub fn new(count: usize, cursor: CalendarDate, mode: PageMode) -> Self {
        Self {
            count,
            cursor,
            mode,
        }
    }
}

/// Picks up to `count` keys on or before `cursor` from a newest-first list.
///
/// Canonical keys are fixed width, so string comparison is date comparison.
pub fn select_page_keys(sorted_desc: &[String], cursor: &CalendarDate, count: usize) -> Vec<String> {
    let cursor_key = cursor.to_key();
    sorted_desc
        .iter()
        .filter(|key| key.as_str() <= cursor_key.as_str())
        .take(count)
        .cloned()
        .collect()
}

/// Loads one page of notes, newest first.
pub fn load_page<S: FileStore>(
    index: &mut NoteIndex<S>,
    request: &PageRequest,
) -> Vec<NoteRecord<S::Handle>> {
    if request.count == 0 {
        return Vec::new();
    }

    let started_at = Instant::now();
    let keys = index.scan(false);
    let selected = select_page_keys(&keys, &request.cursor, request.count);

    let mut records = Vec::with_capacity(selected.len());
    let mut failed_reads = 0usize;
    for key in selected {
        let Ok(date) = CalendarDate::parse(&key) else {
            continue;
        };
        let Some(handle) = index.get_handle(&key).cloned() else {
            continue;
        };
        let content = match index.store().read_file(&handle) {
            Ok(content) => content,
            Err(err) => {
                failed_reads += 1;
                warn!(
                    "event=page_read module=page status=error key={} error={}",
                    key, err
                );
                String::new()
            }
        };
        records.push(NoteRecord::materialized(date, content, handle));
    }

    debug!(
        "event=page_load module=page status=ok mode={} cursor={} requested={} returned={} failed_reads={} duration_ms={}",
        request.mode,
        request.cursor,
        request.count,
        records.len(),
        failed_reads,
        started_at.elapsed().as_millis()
    );
    records
}

/// Cursor for the page after `records`: the day before the oldest shown.
///
/// Returns `None` for an empty page or when the oldest note sits on the
/// lowest supported date.
pub fn older_cursor<H>(records: &[NoteRecord<H>]) -> Option<CalendarDate> {
    records
        .iter()
        .map(|record| record.date)
        .min()
        .and_then(|oldest| oldest.subtract_days(1))
}

/// Short-page heuristic: `true` only when fewer notes came back than asked.
///
/// A page that exactly fills `requested` at the true end of history reports
/// `false`; the following request then comes back empty.
pub fn page_is_exhausted(returned: usize, requested: usize) -> bool {
    returned < requested
}
