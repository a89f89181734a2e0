//! Canonical domain model for timeline events and user timelines.
//!
//! # Responsibility
//! - Define the data structures shared by layout, membership and storage.
//! - Keep identity and lifecycle rules in one place.
//!
//! # Invariants
//! - Every domain object is identified by a stable uuid.
//! - Deletion is represented by soft-delete tombstones, not hard delete.
//! - An event id appears in at most one membership list of a timeline.

pub mod event;
pub mod timeline;
