//! Tag-driven timeline membership tracking.
//!
//! # Responsibility
//! - Compute membership-state transitions when events are edited.
//! - Apply the resulting intents to timeline records through the store
//!   seam in one batch.
//!
//! # Invariants
//! - Planning never mutates anything; applying mutates only the store.
//! - Callers serialize tracker invocations (single-writer semantics).
//!
//! # See also
//! - `model::timeline` for the membership-state model.

pub mod diag;
pub mod matcher;
pub mod store;
pub mod tracker;
