//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate index and store calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod note_service;
pub mod page_service;
