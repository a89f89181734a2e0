use chronoboard_core::{
    apply_timeline_updates, plan_timeline_updates, resync_all_timelines, CaptureSink,
    MembershipStatus, MemoryTimelineStore, NullSink, StoreResult, TagMode, Timeline,
    TimelineEvent, TimelineOrigin, TimelineStore, UpdateIntent, UpdateIntentKind,
};

fn event_with_tags(tags: &[&str]) -> TimelineEvent {
    let mut event = TimelineEvent::new("subject", 0);
    event.tags = tags.iter().map(|tag| tag.to_string()).collect();
    event
}

fn timeline_with(tags: &[&str], tag_mode: TagMode) -> Timeline {
    Timeline::new(
        "watched",
        tags.iter().map(|tag| tag.to_string()).collect(),
        tag_mode,
    )
}

/// Store wrapper asserting the batched single-call contract.
struct CountingStore {
    inner: MemoryTimelineStore,
    replace_calls: usize,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: MemoryTimelineStore::new(),
            replace_calls: 0,
        }
    }
}

impl TimelineStore for CountingStore {
    fn replace(&mut self, timelines: &[Timeline]) -> StoreResult<()> {
        self.replace_calls += 1;
        self.inner.replace(timelines)
    }
}

#[test]
fn first_time_match_emits_exactly_one_pending_intent() {
    let timeline = timeline_with(&["war"], TagMode::And);
    let old = event_with_tags(&[]);
    let mut updated = old.clone();
    updated.tags = vec!["war".to_string()];

    let intents = plan_timeline_updates(&updated, &[timeline.clone()], Some(&old), &NullSink);
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].kind, UpdateIntentKind::AddPending);
    assert_eq!(intents[0].timeline_id, timeline.uuid);
    assert_eq!(intents[0].event_id, updated.uuid);
}

#[test]
fn new_event_with_no_old_form_goes_pending() {
    let timeline = timeline_with(&["war"], TagMode::Or);
    let event = event_with_tags(&["war", "naval"]);

    let intents = plan_timeline_updates(&event, &[timeline], None, &NullSink);
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].kind, UpdateIntentKind::AddPending);
}

#[test]
fn still_matching_registered_event_is_left_alone() {
    let event = event_with_tags(&["war"]);
    let mut timeline = timeline_with(&["war"], TagMode::Or);
    timeline.place_membership(event.uuid, MembershipStatus::Registered);

    let old = event.clone();
    let intents = plan_timeline_updates(&event, &[timeline], Some(&old), &NullSink);
    assert!(intents.is_empty());
}

#[test]
fn removed_event_matching_again_stays_removed() {
    let mut updated = event_with_tags(&["war"]);
    let old = event_with_tags(&[]);
    updated.uuid = old.uuid;
    let mut timeline = timeline_with(&["war"], TagMode::Or);
    timeline.place_membership(updated.uuid, MembershipStatus::Removed);

    // Only untracked events transition to pending; a removed event needs
    // a manual decision to come back.
    let intents = plan_timeline_updates(&updated, &[timeline], Some(&old), &NullSink);
    assert!(intents.is_empty());
}

#[test]
fn losing_the_match_retires_registered_membership() {
    let old = event_with_tags(&["war", "ancient"]);
    let mut updated = old.clone();
    updated.tags = vec!["ancient".to_string()];

    let mut timeline = timeline_with(&["war"], TagMode::And);
    timeline.place_membership(old.uuid, MembershipStatus::Registered);
    let timelines = vec![timeline];

    let intents = plan_timeline_updates(&updated, &timelines, Some(&old), &NullSink);
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].kind, UpdateIntentKind::AddRemoved);

    let mut store = MemoryTimelineStore::new();
    let applied =
        apply_timeline_updates(&intents, &timelines, 7_777, &mut store, &NullSink).unwrap();
    assert_eq!(applied.len(), 1);

    let after = &applied[0];
    assert!(!after.registered.contains(&old.uuid));
    assert!(!after.pending.contains(&old.uuid));
    assert!(after.removed.contains(&old.uuid));
    assert_eq!(after.registered_count, 0);
    assert_eq!(after.removed_count, 1);
    assert_eq!(after.updated_at, 7_777);
    assert_eq!(store.get(after.uuid).unwrap(), after);
}

#[test]
fn losing_the_match_also_retires_pending_membership() {
    let old = event_with_tags(&["war"]);
    let mut updated = old.clone();
    updated.tags.clear();

    let mut timeline = timeline_with(&["war"], TagMode::Or);
    timeline.place_membership(old.uuid, MembershipStatus::Pending);

    let intents = plan_timeline_updates(&updated, &[timeline], Some(&old), &NullSink);
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].kind, UpdateIntentKind::AddRemoved);
}

#[test]
fn search_result_and_temporary_timelines_never_receive_intents() {
    let event = event_with_tags(&["war"]);
    let mut snapshot = timeline_with(&["war"], TagMode::Or);
    snapshot.origin = TimelineOrigin::SearchResult;
    let mut scratch = timeline_with(&["war"], TagMode::Or);
    scratch.origin = TimelineOrigin::Temporary;

    let intents = plan_timeline_updates(&event, &[snapshot, scratch], None, &NullSink);
    assert!(intents.is_empty());
}

#[test]
fn intents_for_missing_timelines_are_skipped_silently() {
    let event = event_with_tags(&["war"]);
    let known = timeline_with(&["war"], TagMode::Or);
    let phantom = timeline_with(&["war"], TagMode::Or);

    let intents = vec![
        UpdateIntent {
            kind: UpdateIntentKind::AddPending,
            timeline_id: phantom.uuid,
            event_id: event.uuid,
            reason: "tag_match_gained",
        },
        UpdateIntent {
            kind: UpdateIntentKind::AddPending,
            timeline_id: known.uuid,
            event_id: event.uuid,
            reason: "tag_match_gained",
        },
    ];

    let diag = CaptureSink::new();
    let mut store = MemoryTimelineStore::new();
    let applied =
        apply_timeline_updates(&intents, &[known.clone()], 1, &mut store, &diag).unwrap();

    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].uuid, known.uuid);
    assert_eq!(diag.count("timeline_missing"), 1);
}

#[test]
fn apply_batches_all_timelines_into_one_replace_call() {
    let event = event_with_tags(&["war"]);
    let first = timeline_with(&["war"], TagMode::Or);
    let second = timeline_with(&["war"], TagMode::And);
    let timelines = vec![first, second];

    let intents = plan_timeline_updates(&event, &timelines, None, &NullSink);
    assert_eq!(intents.len(), 2);

    let mut store = CountingStore::new();
    apply_timeline_updates(&intents, &timelines, 1, &mut store, &NullSink).unwrap();
    assert_eq!(store.replace_calls, 1);
    assert_eq!(store.inner.len(), 2);
}

#[test]
fn empty_plan_skips_the_store_entirely() {
    let mut store = CountingStore::new();
    let applied = apply_timeline_updates(&[], &[], 1, &mut store, &NullSink).unwrap();
    assert!(applied.is_empty());
    assert_eq!(store.replace_calls, 0);
}

#[test]
fn manual_registration_intent_promotes_pending_membership() {
    let event = event_with_tags(&["war"]);
    let mut timeline = timeline_with(&["war"], TagMode::Or);
    timeline.place_membership(event.uuid, MembershipStatus::Pending);

    let intent = UpdateIntent {
        kind: UpdateIntentKind::AddRegistered,
        timeline_id: timeline.uuid,
        event_id: event.uuid,
        reason: "manual_registration",
    };
    let mut store = MemoryTimelineStore::new();
    let applied =
        apply_timeline_updates(&[intent], &[timeline], 1, &mut store, &NullSink).unwrap();

    assert_eq!(
        applied[0].membership_status(event.uuid),
        MembershipStatus::Registered
    );
    assert_eq!(applied[0].pending_count, 0);
    assert_eq!(applied[0].registered_count, 1);
}

#[test]
fn full_resync_registers_every_matching_event_as_pending() {
    let war_event = event_with_tags(&["war"]);
    let art_event = event_with_tags(&["art"]);
    let untagged = event_with_tags(&[]);
    let events = vec![war_event.clone(), art_event.clone(), untagged];

    let wars = timeline_with(&["war"], TagMode::Or);
    let culture = timeline_with(&["art", "music"], TagMode::Or);
    let timelines = vec![wars.clone(), culture.clone()];

    let diag = CaptureSink::new();
    let mut store = MemoryTimelineStore::new();
    let applied =
        resync_all_timelines(&events, &timelines, 42, &mut store, &diag).unwrap();

    assert_eq!(applied.len(), 2);
    let wars_after = store.get(wars.uuid).unwrap();
    assert_eq!(
        wars_after.membership_status(war_event.uuid),
        MembershipStatus::Pending
    );
    assert_eq!(wars_after.pending_count, 1);

    let culture_after = store.get(culture.uuid).unwrap();
    assert_eq!(
        culture_after.membership_status(art_event.uuid),
        MembershipStatus::Pending
    );
    assert_eq!(diag.count("membership_plan"), 2);
}
