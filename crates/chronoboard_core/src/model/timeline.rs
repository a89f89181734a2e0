//! User timeline domain model.
//!
//! # Responsibility
//! - Define the timeline record with its tag filter and membership lists.
//! - Enforce the at-most-one-list membership invariant on every mutation.
//! - Derive membership counts from list contents.
//!
//! # Invariants
//! - An event id appears in at most one of registered/pending/removed.
//! - Count fields always equal the length of their backing list.
//! - `SearchResult`/`Temporary` origin timelines are excluded from
//!   tag-driven auto-update.

use crate::model::event::EventId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a user timeline.
pub type TimelineId = Uuid;

/// Combination rule for a timeline's tag filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagMode {
    /// Every configured tag must be present on the event.
    And,
    /// At least one configured tag must be present on the event.
    Or,
}

/// How a timeline came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineOrigin {
    /// Created explicitly by a user.
    User,
    /// Snapshot of a search result set.
    SearchResult,
    /// Scratch timeline not meant to persist.
    Temporary,
}

/// An event's relationship to one timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Not tracked by the timeline.
    None,
    /// Matched the tag filter, awaiting manual confirmation.
    Pending,
    /// Confirmed member.
    Registered,
    /// Previously tracked, no longer matching.
    Removed,
}

/// Validation failure for timeline records.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineValidationError {
    /// Name is empty or whitespace-only.
    BlankName,
    /// The same event id appears in more than one membership list.
    OverlappingMembership(EventId),
}

impl Display for TimelineValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "timeline name cannot be blank"),
            Self::OverlappingMembership(id) => {
                write!(f, "event {id} appears in more than one membership list")
            }
        }
    }
}

impl Error for TimelineValidationError {}

/// Canonical record for one user timeline.
///
/// Membership lists are externally visible state; the tracker mutates them
/// only through [`Timeline::place_membership`], which keeps the lists
/// disjoint and the counts in sync. List fields default to empty so
/// records from lenient external sources stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Stable global ID.
    pub uuid: TimelineId,
    /// Display name.
    pub name: String,
    /// Normalized lowercase tags forming the auto-update filter.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Combination rule applied to `tags`.
    pub tag_mode: TagMode,
    /// Creation origin; controls auto-update eligibility.
    pub origin: TimelineOrigin,
    /// Confirmed member event ids.
    #[serde(default)]
    pub registered: Vec<EventId>,
    /// Auto-matched event ids awaiting confirmation.
    #[serde(default)]
    pub pending: Vec<EventId>,
    /// Event ids that stopped matching while tracked.
    #[serde(default)]
    pub removed: Vec<EventId>,
    /// Derived count of `registered`.
    #[serde(default)]
    pub registered_count: u32,
    /// Derived count of `pending`.
    #[serde(default)]
    pub pending_count: u32,
    /// Derived count of `removed`.
    #[serde(default)]
    pub removed_count: u32,
    /// Last mutation timestamp in Unix epoch milliseconds.
    #[serde(default)]
    pub updated_at: i64,
    /// Soft delete tombstone.
    #[serde(default)]
    pub is_deleted: bool,
}

impl Timeline {
    /// Creates a user-origin timeline with the given tag filter.
    pub fn new(name: impl Into<String>, tags: Vec<String>, tag_mode: TagMode) -> Self {
        Self::with_origin(name, tags, tag_mode, TimelineOrigin::User)
    }

    /// Creates a timeline with an explicit origin.
    pub fn with_origin(
        name: impl Into<String>,
        tags: Vec<String>,
        tag_mode: TagMode,
        origin: TimelineOrigin,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            tags,
            tag_mode,
            origin,
            registered: Vec::new(),
            pending: Vec::new(),
            removed: Vec::new(),
            registered_count: 0,
            pending_count: 0,
            removed_count: 0,
            updated_at: 0,
            is_deleted: false,
        }
    }

    /// Checks structural contracts of this record.
    pub fn validate(&self) -> Result<(), TimelineValidationError> {
        if self.name.trim().is_empty() {
            return Err(TimelineValidationError::BlankName);
        }
        for id in self.pending.iter().chain(&self.removed) {
            if self.registered.contains(id) {
                return Err(TimelineValidationError::OverlappingMembership(*id));
            }
        }
        for id in &self.removed {
            if self.pending.contains(id) {
                return Err(TimelineValidationError::OverlappingMembership(*id));
            }
        }
        Ok(())
    }

    /// Returns the membership status of one event in this timeline.
    ///
    /// Defaults to [`MembershipStatus::None`] for unknown ids.
    pub fn membership_status(&self, event_id: EventId) -> MembershipStatus {
        if self.registered.contains(&event_id) {
            MembershipStatus::Registered
        } else if self.pending.contains(&event_id) {
            MembershipStatus::Pending
        } else if self.removed.contains(&event_id) {
            MembershipStatus::Removed
        } else {
            MembershipStatus::None
        }
    }

    /// Moves one event into the list named by `status`.
    ///
    /// The id is first removed from all three lists, so the disjointness
    /// invariant holds regardless of the previous state.
    /// [`MembershipStatus::None`] clears the event from the timeline.
    pub fn place_membership(&mut self, event_id: EventId, status: MembershipStatus) {
        self.clear_membership(event_id);
        match status {
            MembershipStatus::Registered => self.registered.push(event_id),
            MembershipStatus::Pending => self.pending.push(event_id),
            MembershipStatus::Removed => self.removed.push(event_id),
            MembershipStatus::None => {}
        }
        self.recompute_counts();
    }

    /// Removes one event from every membership list.
    pub fn clear_membership(&mut self, event_id: EventId) {
        self.registered.retain(|id| *id != event_id);
        self.pending.retain(|id| *id != event_id);
        self.removed.retain(|id| *id != event_id);
        self.recompute_counts();
    }

    /// Recomputes the three derived count fields from list contents.
    pub fn recompute_counts(&mut self) {
        self.registered_count = self.registered.len() as u32;
        self.pending_count = self.pending.len() as u32;
        self.removed_count = self.removed.len() as u32;
    }

    /// Returns whether tag-driven auto-update skips this timeline.
    pub fn is_auto_update_excluded(&self) -> bool {
        matches!(
            self.origin,
            TimelineOrigin::SearchResult | TimelineOrigin::Temporary
        )
    }
}
