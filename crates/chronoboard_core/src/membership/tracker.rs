//! Membership update planning and batched application.
//!
//! # Responsibility
//! - Turn an event edit (old/new form) into membership update intents.
//! - Apply intents to timeline records and push them through the store
//!   seam in one batch.
//!
//! # Invariants
//! - Planning is read-only; it emits intents, never mutations.
//! - `SearchResult`/`Temporary` origin timelines never receive intents.
//! - A missing timeline for an intent is skipped, not an error.
//! - All touched timelines reach the store in a single `replace` call.

use crate::membership::diag::{Diagnostic, DiagnosticSink};
use crate::membership::matcher::matches_tag_filter;
use crate::membership::store::{StoreResult, TimelineStore};
use crate::model::event::{EventId, TimelineEvent};
use crate::model::timeline::{MembershipStatus, Timeline, TimelineId};
use std::collections::BTreeMap;

/// A proposed membership-state change for one (timeline, event) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateIntent {
    pub kind: UpdateIntentKind,
    pub timeline_id: TimelineId,
    pub event_id: EventId,
    /// Stable machine-readable cause, carried into diagnostics.
    pub reason: &'static str,
}

/// Target membership list of an intent.
///
/// `AddRegistered` has no automatic emitter: promotion from pending is a
/// manual action expressed through the same apply path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateIntentKind {
    AddPending,
    AddRegistered,
    AddRemoved,
}

impl UpdateIntentKind {
    fn target_status(self) -> MembershipStatus {
        match self {
            Self::AddPending => MembershipStatus::Pending,
            Self::AddRegistered => MembershipStatus::Registered,
            Self::AddRemoved => MembershipStatus::Removed,
        }
    }
}

/// Plans membership updates for one edited event.
///
/// `old_event` is the pre-edit form; `None` means the event is new (or a
/// full resync pass), so the old form matches nothing. Per eligible
/// timeline:
/// - newly matching and currently untracked → [`UpdateIntentKind::AddPending`],
/// - no longer matching while registered or pending →
///   [`UpdateIntentKind::AddRemoved`],
/// - everything else → no intent.
pub fn plan_timeline_updates(
    updated_event: &TimelineEvent,
    timelines: &[Timeline],
    old_event: Option<&TimelineEvent>,
    diag: &dyn DiagnosticSink,
) -> Vec<UpdateIntent> {
    let mut intents = Vec::new();

    for timeline in timelines {
        if timeline.is_auto_update_excluded() {
            continue;
        }

        let current_status = timeline.membership_status(updated_event.uuid);
        let new_matches = matches_tag_filter(updated_event, timeline);
        let old_matches =
            old_event.is_some_and(|event| matches_tag_filter(event, timeline));

        let kind = if new_matches && !old_matches && current_status == MembershipStatus::None {
            Some((UpdateIntentKind::AddPending, "tag_match_gained"))
        } else if !new_matches
            && old_matches
            && matches!(
                current_status,
                MembershipStatus::Registered | MembershipStatus::Pending
            )
        {
            Some((UpdateIntentKind::AddRemoved, "tag_match_lost"))
        } else {
            None
        };

        let Some((kind, reason)) = kind else {
            continue;
        };

        diag.record(Diagnostic {
            event: "membership_plan",
            timeline_id: Some(timeline.uuid),
            event_id: Some(updated_event.uuid),
            detail: format!(
                "reason={reason} new_matches={new_matches} old_matches={old_matches}"
            ),
        });
        intents.push(UpdateIntent {
            kind,
            timeline_id: timeline.uuid,
            event_id: updated_event.uuid,
            reason,
        });
    }

    intents
}

/// Applies intents to their timelines and stores the batch.
///
/// Each intent moves its event id into the list named by the intent kind
/// (clearing it from the other two), recomputes counts and stamps
/// `updated_at = now_ms`. Intents whose timeline is not in `timelines`
/// are skipped silently. All touched records are pushed in ONE
/// `store.replace` call; an empty plan skips the store entirely.
///
/// Returns the updated timeline records in stable id order.
pub fn apply_timeline_updates(
    intents: &[UpdateIntent],
    timelines: &[Timeline],
    now_ms: i64,
    store: &mut dyn TimelineStore,
    diag: &dyn DiagnosticSink,
) -> StoreResult<Vec<Timeline>> {
    let mut touched: BTreeMap<TimelineId, Timeline> = BTreeMap::new();

    for intent in intents {
        if !touched.contains_key(&intent.timeline_id) {
            let Some(found) = timelines
                .iter()
                .find(|timeline| timeline.uuid == intent.timeline_id)
            else {
                diag.record(Diagnostic {
                    event: "timeline_missing",
                    timeline_id: Some(intent.timeline_id),
                    event_id: Some(intent.event_id),
                    detail: format!("reason={}", intent.reason),
                });
                continue;
            };
            touched.insert(intent.timeline_id, found.clone());
        }

        if let Some(timeline) = touched.get_mut(&intent.timeline_id) {
            timeline.place_membership(intent.event_id, intent.kind.target_status());
            timeline.updated_at = now_ms;
        }
    }

    let batch: Vec<Timeline> = touched.into_values().collect();
    if !batch.is_empty() {
        store.replace(&batch)?;
    }

    diag.record(Diagnostic {
        event: "membership_apply",
        timeline_id: None,
        event_id: None,
        detail: format!("intents={} timelines={}", intents.len(), batch.len()),
    });

    Ok(batch)
}

/// Full manual resync: plans every event against every timeline with no
/// old form and applies the union of intents in one batch.
///
/// Distinct from the incremental single-event path; used after imports
/// or when membership state is suspected stale.
pub fn resync_all_timelines(
    events: &[TimelineEvent],
    timelines: &[Timeline],
    now_ms: i64,
    store: &mut dyn TimelineStore,
    diag: &dyn DiagnosticSink,
) -> StoreResult<Vec<Timeline>> {
    let mut intents = Vec::new();
    for event in events {
        intents.extend(plan_timeline_updates(event, timelines, None, diag));
    }
    apply_timeline_updates(&intents, timelines, now_ms, store, diag)
}
