//! Event use-case service.
//!
//! # Responsibility
//! - Provide event create/update/get/list/delete APIs.
//! - Run the membership tracker on every mutation with the event's
//!   old/new form, applying intents through the timeline store.
//!
//! # Invariants
//! - Updates use full replacement semantics, tags included.
//! - Tracker invocations are serialized by construction: each runs
//!   inside the service call that triggered it.
//! - Deleting an event treats it as matching no timeline.

use crate::membership::diag::DiagnosticSink;
use crate::membership::store::StoreError;
use crate::membership::tracker::{apply_timeline_updates, plan_timeline_updates};
use crate::model::event::{EventId, TimelineEvent};
use crate::repo::event_repo::{
    normalize_tags, EventListQuery, EventRepository, RepoError, SqliteEventRepository,
};
use crate::repo::timeline_repo::{
    SqliteTimelineRepository, TimelineRepoError, TimelineRepository,
};
use crate::service::now_epoch_ms;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for event use-cases.
#[derive(Debug)]
pub enum EventServiceError {
    /// Tag input contains empty values.
    InvalidTag(String),
    /// Target event does not exist.
    EventNotFound(EventId),
    /// Event persistence failure.
    Repo(RepoError),
    /// Timeline persistence failure.
    TimelineRepo(TimelineRepoError),
    /// Membership batch apply failure.
    Store(StoreError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for EventServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTag(value) => write!(f, "invalid tag: `{value}`"),
            Self::EventNotFound(id) => write!(f, "event not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::TimelineRepo(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent event state: {details}"),
        }
    }
}

impl Error for EventServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::TimelineRepo(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for EventServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::EventNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<TimelineRepoError> for EventServiceError {
    fn from(value: TimelineRepoError) -> Self {
        Self::TimelineRepo(value)
    }
}

impl From<StoreError> for EventServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Full-form input for event create/update.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub start_ms: i64,
    pub width_px: Option<f64>,
    pub color: Option<String>,
    pub tags: Vec<String>,
}

impl EventDraft {
    /// Creates a draft with no tags or presentation overrides.
    pub fn new(title: impl Into<String>, start_ms: i64) -> Self {
        Self {
            title: title.into(),
            start_ms,
            width_px: None,
            color: None,
            tags: Vec::new(),
        }
    }
}

/// Event service facade over one migrated connection.
pub struct EventService<'conn> {
    conn: &'conn mut Connection,
    diag: &'conn dyn DiagnosticSink,
}

impl<'conn> EventService<'conn> {
    /// Creates a service over a migrated connection and diagnostic sink.
    pub fn new(conn: &'conn mut Connection, diag: &'conn dyn DiagnosticSink) -> Self {
        Self { conn, diag }
    }

    /// Creates one event and registers it with matching timelines as
    /// pending.
    pub fn create_event(&mut self, draft: &EventDraft) -> Result<TimelineEvent, EventServiceError> {
        reject_blank_tags(&draft.tags)?;

        let mut event = TimelineEvent::new(draft.title.clone(), draft.start_ms);
        event.width_px = draft.width_px;
        event.color = draft.color.clone();
        event.tags = normalize_tags(&draft.tags);

        {
            let mut repo = SqliteEventRepository::try_new(&mut *self.conn)?;
            repo.create_event(&event)?;
        }
        self.sync_memberships(&event, None)?;

        let repo = SqliteEventRepository::try_new(&mut *self.conn)?;
        repo.get_event(event.uuid, false)?
            .ok_or(EventServiceError::InconsistentState(
                "created event not found in read-back",
            ))
    }

    /// Replaces one event fully and reconciles timeline memberships
    /// against its previous form.
    pub fn update_event(
        &mut self,
        id: EventId,
        draft: &EventDraft,
    ) -> Result<TimelineEvent, EventServiceError> {
        reject_blank_tags(&draft.tags)?;

        let old = self
            .load_event(id)?
            .ok_or(EventServiceError::EventNotFound(id))?;

        let mut updated = old.clone();
        updated.title = draft.title.clone();
        updated.start_ms = draft.start_ms;
        updated.width_px = draft.width_px;
        updated.color = draft.color.clone();
        updated.tags = normalize_tags(&draft.tags);

        {
            let mut repo = SqliteEventRepository::try_new(&mut *self.conn)?;
            repo.update_event(&updated)?;
        }
        self.sync_memberships(&updated, Some(&old))?;

        self.load_event(id)?
            .ok_or(EventServiceError::InconsistentState(
                "updated event not found in read-back",
            ))
    }

    /// Soft-deletes one event and retires its timeline memberships.
    pub fn delete_event(&mut self, id: EventId) -> Result<(), EventServiceError> {
        let old = self
            .load_event(id)?
            .ok_or(EventServiceError::EventNotFound(id))?;

        {
            let repo = SqliteEventRepository::try_new(&mut *self.conn)?;
            repo.soft_delete_event(id)?;
        }

        // A deleted event matches nothing: registered/pending memberships
        // transition to removed.
        let mut stripped = old.clone();
        stripped.tags.clear();
        stripped.soft_delete();
        self.sync_memberships(&stripped, Some(&old))
    }

    /// Gets one event by stable ID.
    pub fn get_event(&mut self, id: EventId) -> Result<Option<TimelineEvent>, EventServiceError> {
        self.load_event(id)
    }

    /// Lists events using filter and pagination options.
    pub fn list_events(
        &mut self,
        query: &EventListQuery,
    ) -> Result<Vec<TimelineEvent>, EventServiceError> {
        let repo = SqliteEventRepository::try_new(&mut *self.conn)?;
        Ok(repo.list_events(query)?)
    }

    /// Lists normalized tags known by storage.
    pub fn list_tags(&mut self) -> Result<Vec<String>, EventServiceError> {
        let repo = SqliteEventRepository::try_new(&mut *self.conn)?;
        Ok(repo.list_tags()?)
    }

    fn load_event(&mut self, id: EventId) -> Result<Option<TimelineEvent>, EventServiceError> {
        let repo = SqliteEventRepository::try_new(&mut *self.conn)?;
        Ok(repo.get_event(id, false)?)
    }

    /// Plans and applies membership updates for one event edit.
    fn sync_memberships(
        &mut self,
        updated: &TimelineEvent,
        old: Option<&TimelineEvent>,
    ) -> Result<(), EventServiceError> {
        let timelines = {
            let repo = SqliteTimelineRepository::try_new(&mut *self.conn)?;
            repo.list_timelines(false)?
        };

        let intents = plan_timeline_updates(updated, &timelines, old, self.diag);
        let mut store = SqliteTimelineRepository::try_new(&mut *self.conn)?;
        apply_timeline_updates(&intents, &timelines, now_epoch_ms(), &mut store, self.diag)?;
        Ok(())
    }
}

fn reject_blank_tags(tags: &[String]) -> Result<(), EventServiceError> {
    for tag in tags {
        if tag.trim().is_empty() {
            return Err(EventServiceError::InvalidTag(tag.clone()));
        }
    }
    Ok(())
}
