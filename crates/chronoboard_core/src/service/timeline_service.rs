//! Timeline use-case service.
//!
//! # Responsibility
//! - Provide timeline create/get/list/delete APIs with normalized tags.
//! - Expose the full membership resync pass and search-result snapshots.
//! - Host the manual pending → registered promotion path.
//!
//! # Invariants
//! - Search-result timelines snapshot their hits once and are never
//!   auto-updated afterwards.
//! - Promotion to registered only happens through [`TimelineService::register_event`];
//!   the tracker never emits it on its own.

use crate::membership::diag::DiagnosticSink;
use crate::membership::store::StoreError;
use crate::membership::tracker::{
    apply_timeline_updates, resync_all_timelines, UpdateIntent, UpdateIntentKind,
};
use crate::model::event::EventId;
use crate::model::timeline::{TagMode, Timeline, TimelineId, TimelineOrigin};
use crate::repo::event_repo::{
    normalize_tags, EventListQuery, EventRepository, RepoError, SqliteEventRepository,
};
use crate::repo::timeline_repo::{
    SqliteTimelineRepository, TimelineRepoError, TimelineRepository,
};
use crate::search::fts::{search_events, SearchError, SearchQuery};
use crate::service::now_epoch_ms;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for timeline use-cases.
#[derive(Debug)]
pub enum TimelineServiceError {
    /// Name is empty or whitespace-only.
    InvalidName(String),
    /// Tag input contains empty values.
    InvalidTag(String),
    /// Target timeline does not exist.
    TimelineNotFound(TimelineId),
    /// Timeline persistence failure.
    Repo(TimelineRepoError),
    /// Event persistence failure.
    Events(RepoError),
    /// Membership batch apply failure.
    Store(StoreError),
    /// Full-text search failure.
    Search(SearchError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for TimelineServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(value) => write!(f, "invalid timeline name: `{value}`"),
            Self::InvalidTag(value) => write!(f, "invalid tag: `{value}`"),
            Self::TimelineNotFound(id) => write!(f, "timeline not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Events(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent timeline state: {details}")
            }
            Self::Search(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TimelineServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Events(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Search(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TimelineRepoError> for TimelineServiceError {
    fn from(value: TimelineRepoError) -> Self {
        match value {
            TimelineRepoError::NotFound(id) => Self::TimelineNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<RepoError> for TimelineServiceError {
    fn from(value: RepoError) -> Self {
        Self::Events(value)
    }
}

impl From<StoreError> for TimelineServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<SearchError> for TimelineServiceError {
    fn from(value: SearchError) -> Self {
        Self::Search(value)
    }
}

/// Input for creating a user timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineDraft {
    pub name: String,
    pub tags: Vec<String>,
    pub tag_mode: TagMode,
}

/// Timeline service facade over one migrated connection.
pub struct TimelineService<'conn> {
    conn: &'conn mut Connection,
    diag: &'conn dyn DiagnosticSink,
}

impl<'conn> TimelineService<'conn> {
    /// Creates a service over a migrated connection and diagnostic sink.
    pub fn new(conn: &'conn mut Connection, diag: &'conn dyn DiagnosticSink) -> Self {
        Self { conn, diag }
    }

    /// Creates one user-origin timeline with a normalized tag filter.
    pub fn create_timeline(
        &mut self,
        draft: &TimelineDraft,
    ) -> Result<Timeline, TimelineServiceError> {
        if draft.name.trim().is_empty() {
            return Err(TimelineServiceError::InvalidName(draft.name.clone()));
        }
        for tag in &draft.tags {
            if tag.trim().is_empty() {
                return Err(TimelineServiceError::InvalidTag(tag.clone()));
            }
        }

        let timeline = Timeline::new(
            draft.name.clone(),
            normalize_tags(&draft.tags),
            draft.tag_mode,
        );
        let mut repo = SqliteTimelineRepository::try_new(&mut *self.conn)?;
        repo.create_timeline(&timeline)?;
        repo.get_timeline(timeline.uuid, false)?
            .ok_or(TimelineServiceError::InconsistentState(
                "created timeline not found in read-back",
            ))
    }

    /// Gets one timeline by stable ID.
    pub fn get_timeline(
        &mut self,
        id: TimelineId,
    ) -> Result<Option<Timeline>, TimelineServiceError> {
        let repo = SqliteTimelineRepository::try_new(&mut *self.conn)?;
        Ok(repo.get_timeline(id, false)?)
    }

    /// Lists timelines in stable id order.
    pub fn list_timelines(&mut self) -> Result<Vec<Timeline>, TimelineServiceError> {
        let repo = SqliteTimelineRepository::try_new(&mut *self.conn)?;
        Ok(repo.list_timelines(false)?)
    }

    /// Soft-deletes one timeline.
    pub fn delete_timeline(&mut self, id: TimelineId) -> Result<(), TimelineServiceError> {
        let repo = SqliteTimelineRepository::try_new(&mut *self.conn)?;
        Ok(repo.soft_delete_timeline(id)?)
    }

    /// Full manual resync: replays every active event against every
    /// timeline and applies the union of membership intents.
    pub fn resync_all(&mut self) -> Result<Vec<Timeline>, TimelineServiceError> {
        let events = {
            let repo = SqliteEventRepository::try_new(&mut *self.conn)?;
            repo.list_events(&EventListQuery::default())?
        };
        let timelines = {
            let repo = SqliteTimelineRepository::try_new(&mut *self.conn)?;
            repo.list_timelines(false)?
        };

        let mut store = SqliteTimelineRepository::try_new(&mut *self.conn)?;
        Ok(resync_all_timelines(
            &events,
            &timelines,
            now_epoch_ms(),
            &mut store,
            self.diag,
        )?)
    }

    /// Snapshots a full-text search into a `SearchResult`-origin
    /// timeline with the hits registered directly.
    pub fn create_search_timeline(
        &mut self,
        name: impl Into<String>,
        query_text: &str,
    ) -> Result<Timeline, TimelineServiceError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TimelineServiceError::InvalidName(name));
        }

        let hits = search_events(&*self.conn, &SearchQuery::new(query_text))?;

        let mut timeline = Timeline::with_origin(
            name,
            Vec::new(),
            TagMode::Or,
            TimelineOrigin::SearchResult,
        );
        timeline.registered = hits.iter().map(|hit| hit.event_id).collect();
        timeline.recompute_counts();

        let mut repo = SqliteTimelineRepository::try_new(&mut *self.conn)?;
        repo.create_timeline(&timeline)?;
        repo.get_timeline(timeline.uuid, false)?
            .ok_or(TimelineServiceError::InconsistentState(
                "search timeline not found in read-back",
            ))
    }

    /// Manually promotes one event to registered membership.
    ///
    /// This is the only path that produces registered state; the tracker
    /// never emits it automatically.
    pub fn register_event(
        &mut self,
        timeline_id: TimelineId,
        event_id: EventId,
    ) -> Result<Timeline, TimelineServiceError> {
        let timelines = {
            let repo = SqliteTimelineRepository::try_new(&mut *self.conn)?;
            repo.list_timelines(false)?
        };
        if !timelines.iter().any(|timeline| timeline.uuid == timeline_id) {
            return Err(TimelineServiceError::TimelineNotFound(timeline_id));
        }

        let intent = UpdateIntent {
            kind: UpdateIntentKind::AddRegistered,
            timeline_id,
            event_id,
            reason: "manual_registration",
        };
        {
            let mut store = SqliteTimelineRepository::try_new(&mut *self.conn)?;
            apply_timeline_updates(
                &[intent],
                &timelines,
                now_epoch_ms(),
                &mut store,
                self.diag,
            )?;
        }

        self.get_timeline(timeline_id)?
            .ok_or(TimelineServiceError::InconsistentState(
                "timeline missing after registration",
            ))
    }
}
