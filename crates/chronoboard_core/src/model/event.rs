//! Timeline event domain model.
//!
//! # Responsibility
//! - Define the canonical event record placed on the board.
//! - Provide lifecycle helpers for soft-delete semantics.
//! - Validate presentation fields before they reach storage.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another event.
//! - `is_deleted` is the source of truth for tombstone state.
//! - `tags` are stored normalized (trimmed, lowercase).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every event on the board.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type EventId = Uuid;

static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid color regex"));

/// Validation failure for event presentation fields.
#[derive(Debug, Clone, PartialEq)]
pub enum EventValidationError {
    /// Title is empty or whitespace-only.
    BlankTitle,
    /// Pixel width is not a finite positive number.
    InvalidWidth(f64),
    /// Color is not a `#rrggbb` hex string.
    InvalidColor(String),
}

impl Display for EventValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "event title cannot be blank"),
            Self::InvalidWidth(value) => write!(f, "event width must be finite and positive, got {value}"),
            Self::InvalidColor(value) => write!(f, "event color must match #rrggbb, got `{value}`"),
        }
    }
}

impl Error for EventValidationError {}

/// Canonical record for one event placed on the board.
///
/// Identity (`uuid`) is immutable; tags and position mutate over the
/// event's life through edit operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Stable global ID used for placement, membership and auditing.
    pub uuid: EventId,
    /// Display title.
    pub title: String,
    /// Position on the time axis in Unix epoch milliseconds.
    pub start_ms: i64,
    /// Normalized lowercase tags driving timeline membership.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Preferred pixel width. `None` means the layout minimum applies.
    pub width_px: Option<f64>,
    /// Display color as `#rrggbb`. `None` means the default palette applies.
    pub color: Option<String>,
    /// Soft delete tombstone to preserve membership history.
    #[serde(default)]
    pub is_deleted: bool,
}

impl TimelineEvent {
    /// Creates a new event with a generated stable ID.
    pub fn new(title: impl Into<String>, start_ms: i64) -> Self {
        Self::with_id(Uuid::new_v4(), title, start_ms)
    }

    /// Creates a new event with a caller-provided stable ID.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(uuid: EventId, title: impl Into<String>, start_ms: i64) -> Self {
        Self {
            uuid,
            title: title.into(),
            start_ms,
            tags: Vec::new(),
            width_px: None,
            color: None,
            is_deleted: false,
        }
    }

    /// Checks presentation fields against storage contracts.
    ///
    /// # Errors
    /// - [`EventValidationError::BlankTitle`] for empty titles.
    /// - [`EventValidationError::InvalidWidth`] for non-finite or
    ///   non-positive widths.
    /// - [`EventValidationError::InvalidColor`] for malformed colors.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.title.trim().is_empty() {
            return Err(EventValidationError::BlankTitle);
        }
        if let Some(width) = self.width_px {
            if !width.is_finite() || width <= 0.0 {
                return Err(EventValidationError::InvalidWidth(width));
            }
        }
        if let Some(color) = self.color.as_deref() {
            if !COLOR_RE.is_match(color) {
                return Err(EventValidationError::InvalidColor(color.to_string()));
            }
        }
        Ok(())
    }

    /// Marks this event as softly deleted (tombstoned).
    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
    }

    /// Clears the soft delete flag.
    pub fn restore(&mut self) {
        self.is_deleted = false;
    }

    /// Returns whether this event should be considered visible/active.
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

#[cfg(test)]
mod tests {
    use super::{EventValidationError, TimelineEvent};

    #[test]
    fn validate_accepts_minimal_event() {
        let event = TimelineEvent::new("fall of rome", 0);
        assert!(event.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_title() {
        let event = TimelineEvent::new("   ", 0);
        assert_eq!(event.validate(), Err(EventValidationError::BlankTitle));
    }

    #[test]
    fn validate_rejects_bad_width_and_color() {
        let mut event = TimelineEvent::new("e", 0);
        event.width_px = Some(f64::NAN);
        assert!(matches!(
            event.validate(),
            Err(EventValidationError::InvalidWidth(_))
        ));

        event.width_px = Some(64.0);
        event.color = Some("red".to_string());
        assert!(matches!(
            event.validate(),
            Err(EventValidationError::InvalidColor(_))
        ));

        event.color = Some("#3FA9c1".to_string());
        assert!(event.validate().is_ok());
    }
}
