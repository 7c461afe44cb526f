//! FFI surface for the daily-notes core.
//! Flutter bindings are generated against the functions in `api`.

pub mod api;
