//! Domain model for dated notes.
//!
//! # Responsibility
//! - Define the calendar date type and its filename codec.
//! - Define the point-in-time note record handed to consumers.
//!
//! # Invariants
//! - Every note is identified by exactly one canonical date key.
//! - Note records are snapshots; writes go back through `NoteService`.

pub mod date;
pub mod note;
