//! Timeline repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist timeline records with their tag filters and membership
//!   links.
//! - Implement the tracker's batched `replace` store contract.
//!
//! # Invariants
//! - `replace` commits a whole batch in one transaction; partial batches
//!   are never observable.
//! - Membership rows mirror exactly one state per (timeline, event) pair.
//! - Count fields are derived on load, never stored.

use crate::db::DbError;
use crate::membership::store::{StoreError, StoreResult, TimelineStore};
use crate::model::timeline::{
    MembershipStatus, TagMode, Timeline, TimelineId, TimelineOrigin, TimelineValidationError,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const TIMELINE_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    tag_mode,
    origin,
    is_deleted,
    updated_at
FROM timelines";

pub type TimelineRepoResult<T> = Result<T, TimelineRepoError>;

/// Errors from timeline repository operations.
#[derive(Debug)]
pub enum TimelineRepoError {
    Validation(TimelineValidationError),
    Db(DbError),
    NotFound(TimelineId),
    InvalidData(String),
    /// Required table is missing from the connection's schema.
    MissingRequiredTable(&'static str),
}

impl std::fmt::Display for TimelineRepoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "timeline not found: {id}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted timeline data: {message}")
            }
            Self::MissingRequiredTable(table) => {
                write!(f, "timeline repository requires table `{table}`")
            }
        }
    }
}

impl std::error::Error for TimelineRepoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TimelineValidationError> for TimelineRepoError {
    fn from(value: TimelineValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for TimelineRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for TimelineRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for timeline persistence.
pub trait TimelineRepository {
    /// Persists one timeline with tags and memberships in one transaction.
    fn create_timeline(&mut self, timeline: &Timeline) -> TimelineRepoResult<TimelineId>;
    /// Gets one timeline by id with optional deleted-row visibility.
    fn get_timeline(
        &self,
        id: TimelineId,
        include_deleted: bool,
    ) -> TimelineRepoResult<Option<Timeline>>;
    /// Lists timelines sorted by uuid for deterministic iteration.
    fn list_timelines(&self, include_deleted: bool) -> TimelineRepoResult<Vec<Timeline>>;
    /// Soft-deletes a timeline by id.
    fn soft_delete_timeline(&self, id: TimelineId) -> TimelineRepoResult<()>;
}

/// SQLite-backed timeline repository and tracker store.
pub struct SqliteTimelineRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteTimelineRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> TimelineRepoResult<Self> {
        for table in ["timelines", "timeline_tags", "timeline_memberships"] {
            if !table_exists(conn, table)? {
                return Err(TimelineRepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }

    /// Replaces the stored state of every timeline in `timelines`,
    /// committing the whole batch as one transaction.
    pub fn replace_all(&mut self, timelines: &[Timeline]) -> TimelineRepoResult<()> {
        for timeline in timelines {
            timeline.validate()?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for timeline in timelines {
            upsert_timeline_in_tx(&tx, timeline)?;
        }
        tx.commit()?;
        Ok(())
    }
}

impl TimelineRepository for SqliteTimelineRepository<'_> {
    fn create_timeline(&mut self, timeline: &Timeline) -> TimelineRepoResult<TimelineId> {
        timeline.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO timelines (uuid, name, tag_mode, origin, is_deleted, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, (strftime('%s', 'now') * 1000));",
            params![
                timeline.uuid.to_string(),
                timeline.name.as_str(),
                tag_mode_to_db(timeline.tag_mode),
                origin_to_db(timeline.origin),
                bool_to_int(timeline.is_deleted),
            ],
        )?;
        replace_links_in_tx(&tx, timeline)?;
        tx.commit()?;

        Ok(timeline.uuid)
    }

    fn get_timeline(
        &self,
        id: TimelineId,
        include_deleted: bool,
    ) -> TimelineRepoResult<Option<Timeline>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TIMELINE_SELECT_SQL}
             WHERE uuid = ?1
               AND (?2 = 1 OR is_deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            let timeline = assemble_timeline(&*self.conn, row)?;
            return Ok(Some(timeline));
        }

        Ok(None)
    }

    fn list_timelines(&self, include_deleted: bool) -> TimelineRepoResult<Vec<Timeline>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TIMELINE_SELECT_SQL}
             WHERE (?1 = 1 OR is_deleted = 0)
             ORDER BY uuid ASC;"
        ))?;

        let mut rows = stmt.query([bool_to_int(include_deleted)])?;
        let mut timelines = Vec::new();
        while let Some(row) = rows.next()? {
            timelines.push(assemble_timeline(&*self.conn, row)?);
        }

        Ok(timelines)
    }

    fn soft_delete_timeline(&self, id: TimelineId) -> TimelineRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE timelines
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(TimelineRepoError::NotFound(id));
        }

        Ok(())
    }
}

impl TimelineStore for SqliteTimelineRepository<'_> {
    fn replace(&mut self, timelines: &[Timeline]) -> StoreResult<()> {
        self.replace_all(timelines)
            .map_err(|err| StoreError::Backend(Box::new(err)))
    }
}

fn upsert_timeline_in_tx(tx: &Transaction<'_>, timeline: &Timeline) -> TimelineRepoResult<()> {
    tx.execute(
        "INSERT INTO timelines (uuid, name, tag_mode, origin, is_deleted, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (uuid) DO UPDATE SET
            name = excluded.name,
            tag_mode = excluded.tag_mode,
            origin = excluded.origin,
            is_deleted = excluded.is_deleted,
            updated_at = excluded.updated_at;",
        params![
            timeline.uuid.to_string(),
            timeline.name.as_str(),
            tag_mode_to_db(timeline.tag_mode),
            origin_to_db(timeline.origin),
            bool_to_int(timeline.is_deleted),
            timeline.updated_at,
        ],
    )?;
    replace_links_in_tx(tx, timeline)?;
    Ok(())
}

fn replace_links_in_tx(tx: &Transaction<'_>, timeline: &Timeline) -> TimelineRepoResult<()> {
    let timeline_uuid = timeline.uuid.to_string();

    tx.execute(
        "DELETE FROM timeline_tags WHERE timeline_uuid = ?1;",
        [timeline_uuid.as_str()],
    )?;
    for tag in &timeline.tags {
        tx.execute(
            "INSERT OR IGNORE INTO timeline_tags (timeline_uuid, tag) VALUES (?1, ?2);",
            params![timeline_uuid.as_str(), tag.as_str()],
        )?;
    }

    tx.execute(
        "DELETE FROM timeline_memberships WHERE timeline_uuid = ?1;",
        [timeline_uuid.as_str()],
    )?;
    for (state, event_ids) in [
        ("registered", &timeline.registered),
        ("pending", &timeline.pending),
        ("removed", &timeline.removed),
    ] {
        for event_id in event_ids {
            tx.execute(
                "INSERT INTO timeline_memberships (timeline_uuid, event_uuid, state)
                 VALUES (?1, ?2, ?3);",
                params![timeline_uuid.as_str(), event_id.to_string(), state],
            )?;
        }
    }

    Ok(())
}

fn assemble_timeline(conn: &Connection, row: &Row<'_>) -> TimelineRepoResult<Timeline> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        TimelineRepoError::InvalidData(format!(
            "invalid uuid value `{uuid_text}` in timelines.uuid"
        ))
    })?;

    let tag_mode_text: String = row.get("tag_mode")?;
    let tag_mode = parse_tag_mode(&tag_mode_text).ok_or_else(|| {
        TimelineRepoError::InvalidData(format!(
            "invalid tag_mode `{tag_mode_text}` in timelines.tag_mode"
        ))
    })?;

    let origin_text: String = row.get("origin")?;
    let origin = parse_origin(&origin_text).ok_or_else(|| {
        TimelineRepoError::InvalidData(format!(
            "invalid origin `{origin_text}` in timelines.origin"
        ))
    })?;

    let is_deleted = match row.get::<_, i64>("is_deleted")? {
        0 => false,
        1 => true,
        other => {
            return Err(TimelineRepoError::InvalidData(format!(
                "invalid is_deleted value `{other}` in timelines.is_deleted"
            )));
        }
    };

    let mut timeline = Timeline {
        uuid,
        name: row.get("name")?,
        tags: load_timeline_tags(conn, &uuid_text)?,
        tag_mode,
        origin,
        registered: Vec::new(),
        pending: Vec::new(),
        removed: Vec::new(),
        registered_count: 0,
        pending_count: 0,
        removed_count: 0,
        updated_at: row.get("updated_at")?,
        is_deleted,
    };
    load_memberships(conn, &uuid_text, &mut timeline)?;
    timeline.recompute_counts();
    timeline.validate()?;
    Ok(timeline)
}

fn load_timeline_tags(conn: &Connection, timeline_uuid: &str) -> TimelineRepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT tag
         FROM timeline_tags
         WHERE timeline_uuid = ?1
         ORDER BY tag ASC;",
    )?;
    let mut rows = stmt.query([timeline_uuid])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        tags.push(value);
    }
    Ok(tags)
}

fn load_memberships(
    conn: &Connection,
    timeline_uuid: &str,
    timeline: &mut Timeline,
) -> TimelineRepoResult<()> {
    let mut stmt = conn.prepare(
        "SELECT event_uuid, state
         FROM timeline_memberships
         WHERE timeline_uuid = ?1
         ORDER BY event_uuid ASC;",
    )?;
    let mut rows = stmt.query([timeline_uuid])?;
    while let Some(row) = rows.next()? {
        let event_uuid_text: String = row.get(0)?;
        let event_id = Uuid::parse_str(&event_uuid_text).map_err(|_| {
            TimelineRepoError::InvalidData(format!(
                "invalid uuid value `{event_uuid_text}` in timeline_memberships.event_uuid"
            ))
        })?;

        let state_text: String = row.get(1)?;
        let status = parse_state(&state_text).ok_or_else(|| {
            TimelineRepoError::InvalidData(format!(
                "invalid state `{state_text}` in timeline_memberships.state"
            ))
        })?;

        match status {
            MembershipStatus::Registered => timeline.registered.push(event_id),
            MembershipStatus::Pending => timeline.pending.push(event_id),
            MembershipStatus::Removed => timeline.removed.push(event_id),
            MembershipStatus::None => {}
        }
    }
    Ok(())
}

fn tag_mode_to_db(tag_mode: TagMode) -> &'static str {
    match tag_mode {
        TagMode::And => "and",
        TagMode::Or => "or",
    }
}

fn parse_tag_mode(value: &str) -> Option<TagMode> {
    match value {
        "and" => Some(TagMode::And),
        "or" => Some(TagMode::Or),
        _ => None,
    }
}

fn origin_to_db(origin: TimelineOrigin) -> &'static str {
    match origin {
        TimelineOrigin::User => "user",
        TimelineOrigin::SearchResult => "search_result",
        TimelineOrigin::Temporary => "temporary",
    }
}

fn parse_origin(value: &str) -> Option<TimelineOrigin> {
    match value {
        "user" => Some(TimelineOrigin::User),
        "search_result" => Some(TimelineOrigin::SearchResult),
        "temporary" => Some(TimelineOrigin::Temporary),
        _ => None,
    }
}

fn parse_state(value: &str) -> Option<MembershipStatus> {
    match value {
        "registered" => Some(MembershipStatus::Registered),
        "pending" => Some(MembershipStatus::Pending),
        "removed" => Some(MembershipStatus::Removed),
        _ => None,
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn table_exists(conn: &Connection, table: &str) -> TimelineRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
