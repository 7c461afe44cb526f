//! Storage adapters and the date-keyed note index.
//!
//! # Responsibility
//! - Define the file store contract consumed by the core.
//! - Provide local-disk and in-memory store implementations.
//! - Own the cache mapping date keys to file handles.
//!
//! # Invariants
//! - Only this layer talks to `FileStore` for listings.
//! - Store APIs return semantic errors (`NotFound`, `AlreadyExists`,
//!   `NotADirectory`) in addition to raw I/O failures.

pub mod file_store;
pub mod local_store;
pub mod memory_store;
pub mod note_index;
