//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository, tracker and search calls into use-case APIs.
//! - Keep UI layers decoupled from storage details.
//!
//! # Invariants
//! - Every event mutation runs the membership tracker in the same call
//!   path, preserving single-writer semantics.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod event_service;
pub mod timeline_service;

/// Current wall-clock time in Unix epoch milliseconds.
///
/// Clamps to zero for clocks before the epoch instead of failing.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
