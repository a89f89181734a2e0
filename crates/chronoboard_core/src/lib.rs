//! Core domain logic for Chronoboard.
//! This crate is the single source of truth for placement and
//! membership invariants.

pub mod db;
pub mod layout;
pub mod logging;
pub mod membership;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use layout::lanes::{
    layout_events, LaneGroup, LayoutConfig, LayoutGeometry, LayoutOutput, Placement,
    PlacementKind, Point, LANE_COUNT, OVERFLOW_LANE,
};
pub use layout::proximity::{
    should_group_events, DEFAULT_GROUP_DISTANCE_PX, EDGE_MARGIN_PX,
};
pub use layout::scale::{EventGeometry, TimeScale, DAY_MS};
pub use logging::{default_log_level, init_logging, logging_status};
pub use membership::diag::{CaptureSink, Diagnostic, DiagnosticSink, LogSink, NullSink};
pub use membership::matcher::matches_tag_filter;
pub use membership::store::{MemoryTimelineStore, StoreError, StoreResult, TimelineStore};
pub use membership::tracker::{
    apply_timeline_updates, plan_timeline_updates, resync_all_timelines, UpdateIntent,
    UpdateIntentKind,
};
pub use model::event::{EventId, EventValidationError, TimelineEvent};
pub use model::timeline::{
    MembershipStatus, TagMode, Timeline, TimelineId, TimelineOrigin, TimelineValidationError,
};
pub use repo::event_repo::{
    normalize_tag, normalize_tags, EventListQuery, EventRepository, RepoError, RepoResult,
    SqliteEventRepository,
};
pub use repo::timeline_repo::{
    SqliteTimelineRepository, TimelineRepoError, TimelineRepoResult, TimelineRepository,
};
pub use search::fts::{search_events, SearchError, SearchHit, SearchQuery, SearchResult};
pub use service::event_service::{EventDraft, EventService, EventServiceError};
pub use service::timeline_service::{TimelineDraft, TimelineService, TimelineServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
