//! Timeline store seam and in-memory implementation.
//!
//! # Responsibility
//! - Define the single batched-replace contract the tracker writes
//!   through.
//! - Provide an in-memory store for tests and collection-owning callers.
//!
//! # Invariants
//! - One `replace` call is one atomic state transition from the caller's
//!   point of view; no partial batch is observable.

use crate::model::timeline::{Timeline, TimelineId};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by timeline store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure while persisting a timeline batch.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying backend failure (SQLite, remote state, ...).
    Backend(Box<dyn Error + Send + Sync>),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend(err) => write!(f, "timeline store backend error: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err.as_ref()),
        }
    }
}

/// Persistence seam for timeline records.
///
/// The tracker only ever calls `replace` with the full updated records;
/// how they are stored is the implementation's concern.
pub trait TimelineStore {
    /// Replaces the stored state of every timeline in `timelines`.
    fn replace(&mut self, timelines: &[Timeline]) -> StoreResult<()>;
}

/// BTreeMap-backed store for tests and in-process collections.
#[derive(Debug, Default)]
pub struct MemoryTimelineStore {
    timelines: BTreeMap<TimelineId, Timeline>,
}

impl MemoryTimelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds one timeline record.
    pub fn insert(&mut self, timeline: Timeline) {
        self.timelines.insert(timeline.uuid, timeline);
    }

    /// Returns one timeline by id.
    pub fn get(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines.get(&id)
    }

    /// Returns all timelines in stable id order.
    pub fn all(&self) -> Vec<Timeline> {
        self.timelines.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }
}

impl TimelineStore for MemoryTimelineStore {
    fn replace(&mut self, timelines: &[Timeline]) -> StoreResult<()> {
        for timeline in timelines {
            self.timelines.insert(timeline.uuid, timeline.clone());
        }
        Ok(())
    }
}
