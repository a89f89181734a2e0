//! Event repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over canonical `events` storage.
//! - Own tag-link replacement with atomic semantics.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `TimelineEvent::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Tag names are normalized to lowercase before persistence.
//! - Event listing is deterministic: `start_ms ASC, uuid ASC`.

use crate::db::DbError;
use crate::model::event::{EventId, EventValidationError, TimelineEvent};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use uuid::Uuid;

const EVENTS_LIMIT_MAX: u32 = 500;

const EVENT_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    start_ms,
    width_px,
    color,
    is_deleted
FROM events";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for event persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(EventValidationError),
    Db(DbError),
    NotFound(EventId),
    InvalidData(String),
    /// Required table is missing from the connection's schema.
    MissingRequiredTable(&'static str),
}

impl std::fmt::Display for RepoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "event not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted event data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "event repository requires table `{table}`")
            }
        }
    }
}

impl std::error::Error for RepoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EventValidationError> for RepoError {
    fn from(value: EventValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventListQuery {
    /// Optional single-tag exact match filter.
    pub tag: Option<String>,
    pub include_deleted: bool,
    /// Maximum rows to return. `None` means unlimited; values clamp to 500.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for event CRUD operations.
pub trait EventRepository {
    /// Persists one event with its tag links in a single transaction.
    fn create_event(&mut self, event: &TimelineEvent) -> RepoResult<EventId>;
    /// Replaces one event's row and tag links in a single transaction.
    fn update_event(&mut self, event: &TimelineEvent) -> RepoResult<()>;
    /// Gets one event by id with optional deleted-row visibility.
    fn get_event(&self, id: EventId, include_deleted: bool) -> RepoResult<Option<TimelineEvent>>;
    /// Lists events using filter and pagination options.
    fn list_events(&self, query: &EventListQuery) -> RepoResult<Vec<TimelineEvent>>;
    /// Soft-deletes an event by id.
    fn soft_delete_event(&self, id: EventId) -> RepoResult<()>;
    /// Returns all known tags sorted by name.
    fn list_tags(&self) -> RepoResult<Vec<String>>;
}

/// SQLite-backed event repository.
pub struct SqliteEventRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteEventRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        for table in ["events", "tags", "event_tags"] {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }
}

impl EventRepository for SqliteEventRepository<'_> {
    fn create_event(&mut self, event: &TimelineEvent) -> RepoResult<EventId> {
        event.validate()?;
        let tags = normalize_tags(&event.tags);

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO events (uuid, title, start_ms, width_px, color, is_deleted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                event.uuid.to_string(),
                event.title.as_str(),
                event.start_ms,
                event.width_px,
                event.color.as_deref(),
                bool_to_int(event.is_deleted),
            ],
        )?;
        replace_tags_in_tx(&tx, &event.uuid.to_string(), &tags)?;
        tx.commit()?;

        Ok(event.uuid)
    }

    fn update_event(&mut self, event: &TimelineEvent) -> RepoResult<()> {
        event.validate()?;
        let tags = normalize_tags(&event.tags);

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE events
             SET
                title = ?1,
                start_ms = ?2,
                width_px = ?3,
                color = ?4,
                is_deleted = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?6;",
            params![
                event.title.as_str(),
                event.start_ms,
                event.width_px,
                event.color.as_deref(),
                bool_to_int(event.is_deleted),
                event.uuid.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(event.uuid));
        }
        replace_tags_in_tx(&tx, &event.uuid.to_string(), &tags)?;
        tx.commit()?;

        Ok(())
    }

    fn get_event(&self, id: EventId, include_deleted: bool) -> RepoResult<Option<TimelineEvent>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EVENT_SELECT_SQL}
             WHERE uuid = ?1
               AND (?2 = 1 OR is_deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            let mut event = parse_event_row(row)?;
            event.tags = load_tags_for_event(&*self.conn, &event.uuid.to_string())?;
            return Ok(Some(event));
        }

        Ok(None)
    }

    fn list_events(&self, query: &EventListQuery) -> RepoResult<Vec<TimelineEvent>> {
        let mut sql = format!("{EVENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_deleted {
            sql.push_str(" AND is_deleted = 0");
        }

        if let Some(tag) = query.tag.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM event_tags et
                    INNER JOIN tags t ON t.id = et.tag_id
                    WHERE et.event_uuid = events.uuid
                      AND t.name = ? COLLATE NOCASE
                )",
            );
            bind_values.push(Value::Text(tag.clone()));
        }

        sql.push_str(" ORDER BY start_ms ASC, uuid ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit.min(EVENTS_LIMIT_MAX))));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut events = Vec::new();

        while let Some(row) = rows.next()? {
            let mut event = parse_event_row(row)?;
            event.tags = load_tags_for_event(&*self.conn, &event.uuid.to_string())?;
            events.push(event);
        }

        Ok(events)
    }

    fn soft_delete_event(&self, id: EventId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE events
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn list_tags(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM tags ORDER BY name COLLATE NOCASE ASC;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get("name")?;
            tags.push(value.to_lowercase());
        }
        Ok(tags)
    }
}

/// Normalizes one tag value: trimmed, lowercase, non-empty.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes and deduplicates tag values, sorted for stable comparison.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut unique = BTreeSet::new();
    for tag in tags {
        if let Some(value) = normalize_tag(tag) {
            unique.insert(value);
        }
    }
    unique.into_iter().collect()
}

fn replace_tags_in_tx(tx: &Transaction<'_>, event_uuid: &str, tags: &[String]) -> RepoResult<()> {
    tx.execute(
        "DELETE FROM event_tags WHERE event_uuid = ?1;",
        [event_uuid],
    )?;

    for tag in tags {
        tx.execute(
            "INSERT OR IGNORE INTO tags (name) VALUES (?1);",
            [tag.as_str()],
        )?;
        tx.execute(
            "INSERT INTO event_tags (event_uuid, tag_id)
             SELECT ?1, id
             FROM tags
             WHERE name = ?2 COLLATE NOCASE;",
            params![event_uuid, tag.as_str()],
        )?;
    }

    Ok(())
}

fn load_tags_for_event(conn: &Connection, event_uuid: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM event_tags et
         INNER JOIN tags t ON t.id = et.tag_id
         WHERE et.event_uuid = ?1
         ORDER BY t.name COLLATE NOCASE ASC;",
    )?;
    let mut rows = stmt.query([event_uuid])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        tags.push(value.to_lowercase());
    }
    Ok(tags)
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<TimelineEvent> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in events.uuid"))
    })?;

    let is_deleted = match row.get::<_, i64>("is_deleted")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_deleted value `{other}` in events.is_deleted"
            )));
        }
    };

    let event = TimelineEvent {
        uuid,
        title: row.get("title")?,
        start_ms: row.get("start_ms")?,
        tags: Vec::new(),
        width_px: row.get("width_px")?,
        color: row.get("color")?,
        is_deleted,
    };
    event.validate()?;
    Ok(event)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
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
