//! Note record read model.
//!
//! # Responsibility
//! - Join a calendar date with content read from storage.
//! - Track local edit state (`dirty`) for consumers holding a snapshot.
//!
//! # Invariants
//! - `key` is always `date.to_key()`.
//! - `exists == true` implies a file was present when the record was built.

use crate::model::date::CalendarDate;

/// Point-in-time view of one dated note.
///
/// `H` is the storage handle type; it is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord<H> {
    /// Calendar date of the note.
    pub date: CalendarDate,
    /// Canonical `YYYY-MM-DD` key.
    pub key: String,
    /// Raw markdown text.
    pub content: String,
    /// Backing file handle; `None` until the note is materialized.
    pub handle: Option<H>,
    /// Whether a backing file existed when this record was produced.
    pub exists: bool,
    /// Whether `content` carries edits not yet saved.
    pub dirty: bool,
}

impl<H> NoteRecord<H> {
    /// Builds a record for a note that has a backing file.
    pub fn materialized(date: CalendarDate, content: impl Into<String>, handle: H) -> Self {
        Self {
            date,
            key: date.to_key(),
            content: content.into(),
            handle: Some(handle),
            exists: true,
            dirty: false,
        }
    }

    /// Builds an empty record for a date with no file yet.
    pub fn placeholder(date: CalendarDate) -> Self {
        Self {
            date,
            key: date.to_key(),
            content: String::new(),
            handle: None,
            exists: false,
            dirty: false,
        }
    }

    /// Replaces local content and marks the record dirty.
    pub fn edit(&mut self, content: impl Into<String>) {
        let content = content.into();
        if content != self.content {
            self.content = content;
            self.dirty = true;
        }
    }

    /// Content with the optional leading date heading removed.
    pub fn body(&self) -> &str {
        strip_date_heading(&self.content, &self.key)
    }
}

/// Removes a leading line equal to `key` and any blank lines after it.
///
/// Returns `content` unchanged when the first line is anything else.
pub fn strip_date_heading<'a>(content: &'a str, key: &str) -> &'a str {
    let (first, mut rest) = match content.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (content, ""),
    };
    if first.trim_end_matches('\r') != key {
        return content;
    }

    loop {
        let (line, remainder) = match rest.split_once('\n') {
            Some(parts) => parts,
            None => {
                if rest.trim().is_empty() {
                    return "";
                }
                return rest;
            }
        };
        if !line.trim().is_empty() {
            return rest;
        }
        rest = remainder;
    }
}
