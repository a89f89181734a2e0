//! Event placement and grouping engine.
//!
//! # Responsibility
//! - Place events into the three fixed board lanes without overlap.
//! - Collapse colliding overflow events into synthetic groups.
//! - Keep geometry concerns behind the [`lanes::LayoutGeometry`] seam.
//!
//! # Invariants
//! - A layout pass is a pure function: identical inputs produce identical
//!   placements, including group ids.
//! - Input events are never mutated by a pass.

pub mod lanes;
pub mod proximity;
pub mod scale;
