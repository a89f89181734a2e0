use chronoboard_core::db::open_db_in_memory;
use chronoboard_core::{
    EventListQuery, EventRepository, EventValidationError, RepoError, SqliteEventRepository,
    TimelineEvent,
};

#[test]
fn create_and_get_roundtrip_with_normalized_tags() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEventRepository::try_new(&mut conn).unwrap();

    let mut event = TimelineEvent::new("battle of hastings", 1_000);
    event.width_px = Some(140.0);
    event.color = Some("#aa3311".to_string());
    event.tags = vec![
        "War".to_string(),
        "MEDIEVAL".to_string(),
        "war".to_string(),
    ];
    let id = repo.create_event(&event).unwrap();

    let loaded = repo.get_event(id, false).unwrap().unwrap();
    assert_eq!(loaded.uuid, event.uuid);
    assert_eq!(loaded.title, "battle of hastings");
    assert_eq!(loaded.start_ms, 1_000);
    assert_eq!(loaded.width_px, Some(140.0));
    assert_eq!(loaded.color.as_deref(), Some("#aa3311"));
    assert_eq!(loaded.tags, vec!["medieval".to_string(), "war".to_string()]);
    assert!(!loaded.is_deleted);
}

#[test]
fn update_replaces_row_and_full_tag_set() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEventRepository::try_new(&mut conn).unwrap();

    let mut event = TimelineEvent::new("draft", 0);
    event.tags = vec!["war".to_string(), "ancient".to_string()];
    repo.create_event(&event).unwrap();

    event.title = "updated battle".to_string();
    event.start_ms = 5_000;
    event.tags = vec!["Naval".to_string()];
    repo.update_event(&event).unwrap();

    let loaded = repo.get_event(event.uuid, false).unwrap().unwrap();
    assert_eq!(loaded.title, "updated battle");
    assert_eq!(loaded.start_ms, 5_000);
    assert_eq!(loaded.tags, vec!["naval".to_string()]);
}

#[test]
fn update_not_found_returns_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEventRepository::try_new(&mut conn).unwrap();

    let event = TimelineEvent::new("missing", 0);
    let err = repo.update_event(&event).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == event.uuid));
}

#[test]
fn create_rejects_invalid_model_fields() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEventRepository::try_new(&mut conn).unwrap();

    let blank = TimelineEvent::new("   ", 0);
    let err = repo.create_event(&blank).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(EventValidationError::BlankTitle)
    ));

    let mut bad_color = TimelineEvent::new("ok", 0);
    bad_color.color = Some("blue".to_string());
    let err = repo.create_event(&bad_color).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(EventValidationError::InvalidColor(_))
    ));
}

#[test]
fn list_orders_by_start_and_excludes_deleted_by_default() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEventRepository::try_new(&mut conn).unwrap();

    let later = TimelineEvent::new("later", 9_000);
    let earlier = TimelineEvent::new("earlier", 1_000);
    let deleted = TimelineEvent::new("deleted later", 4_000);
    repo.create_event(&later).unwrap();
    repo.create_event(&earlier).unwrap();
    repo.create_event(&deleted).unwrap();
    repo.soft_delete_event(deleted.uuid).unwrap();

    let visible = repo.list_events(&EventListQuery::default()).unwrap();
    assert_eq!(visible.len(), 2);
    assert_eq!(visible[0].uuid, earlier.uuid);
    assert_eq!(visible[1].uuid, later.uuid);

    let all = repo
        .list_events(&EventListQuery {
            include_deleted: true,
            ..EventListQuery::default()
        })
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[test]
fn list_supports_single_tag_filter() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEventRepository::try_new(&mut conn).unwrap();

    let mut tagged = TimelineEvent::new("tagged", 0);
    tagged.tags = vec!["War".to_string()];
    let mut other = TimelineEvent::new("other", 0);
    other.tags = vec!["art".to_string()];
    repo.create_event(&tagged).unwrap();
    repo.create_event(&other).unwrap();

    let filtered = repo
        .list_events(&EventListQuery {
            tag: Some("WAR".to_string()),
            ..EventListQuery::default()
        })
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].uuid, tagged.uuid);
}

#[test]
fn soft_delete_is_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEventRepository::try_new(&mut conn).unwrap();

    let event = TimelineEvent::new("weekly sync", 0);
    repo.create_event(&event).unwrap();

    repo.soft_delete_event(event.uuid).unwrap();
    repo.soft_delete_event(event.uuid).unwrap();

    assert!(repo.get_event(event.uuid, false).unwrap().is_none());
    assert!(repo.get_event(event.uuid, true).unwrap().is_some());
}

#[test]
fn list_tags_returns_sorted_known_tags() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEventRepository::try_new(&mut conn).unwrap();

    let mut event = TimelineEvent::new("tagged", 0);
    event.tags = vec!["zulu".to_string(), "Alpha".to_string()];
    repo.create_event(&event).unwrap();

    assert_eq!(
        repo.list_tags().unwrap(),
        vec!["alpha".to_string(), "zulu".to_string()]
    );
}
