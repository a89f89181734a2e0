//! Tag filter matching.
//!
//! # Responsibility
//! - Decide whether an event satisfies a timeline's tag filter.
//!
//! # Invariants
//! - A timeline with no configured tags never auto-matches.
//! - Comparison assumes both sides hold normalized lowercase tags.

use crate::model::event::TimelineEvent;
use crate::model::timeline::{TagMode, Timeline};

/// Returns whether `event` satisfies `timeline`'s tag filter.
///
/// `And` mode requires every timeline tag on the event, `Or` mode at
/// least one. An empty filter matches nothing regardless of event tags.
pub fn matches_tag_filter(event: &TimelineEvent, timeline: &Timeline) -> bool {
    if timeline.tags.is_empty() {
        return false;
    }

    let has = |tag: &String| event.tags.iter().any(|candidate| candidate == tag);
    match timeline.tag_mode {
        TagMode::And => timeline.tags.iter().all(has),
        TagMode::Or => timeline.tags.iter().any(has),
    }
}

#[cfg(test)]
mod tests {
    use super::matches_tag_filter;
    use crate::model::event::TimelineEvent;
    use crate::model::timeline::{TagMode, Timeline};

    fn event_with_tags(tags: &[&str]) -> TimelineEvent {
        let mut event = TimelineEvent::new("battle", 0);
        event.tags = tags.iter().map(|tag| tag.to_string()).collect();
        event
    }

    fn timeline_with(tags: &[&str], tag_mode: TagMode) -> Timeline {
        Timeline::new(
            "history",
            tags.iter().map(|tag| tag.to_string()).collect(),
            tag_mode,
        )
    }

    #[test]
    fn and_mode_requires_every_tag() {
        let timeline = timeline_with(&["war", "ancient"], TagMode::And);
        assert!(!matches_tag_filter(&event_with_tags(&["war"]), &timeline));
        assert!(matches_tag_filter(
            &event_with_tags(&["war", "ancient"]),
            &timeline
        ));
    }

    #[test]
    fn or_mode_requires_any_tag() {
        let timeline = timeline_with(&["war", "ancient"], TagMode::Or);
        assert!(matches_tag_filter(&event_with_tags(&["war"]), &timeline));
        assert!(!matches_tag_filter(&event_with_tags(&["art"]), &timeline));
    }

    #[test]
    fn empty_filter_never_matches() {
        for tag_mode in [TagMode::And, TagMode::Or] {
            let timeline = timeline_with(&[], tag_mode);
            assert!(!matches_tag_filter(
                &event_with_tags(&["war", "ancient"]),
                &timeline
            ));
        }
    }
}
