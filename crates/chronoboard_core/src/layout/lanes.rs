//! Lane placement engine with overflow grouping.
//!
//! # Responsibility
//! - Assign each event to one of the three fixed lanes.
//! - Detect horizontal collisions and absorb overflow into groups.
//! - Produce the placement records consumed by the rendering layer.
//!
//! # Invariants
//! - Within a lane, no two standalone event rectangles overlap on X.
//! - Group bounds always include `group_padding_px` beyond the union of
//!   absorbed event rectangles.
//! - Group membership only grows within one pass.
//! - Every input event appears exactly once in the output, either as a
//!   standalone placement or marked `hidden_by_group`.

use crate::model::event::{EventId, TimelineEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Number of fixed horizontal lanes.
pub const LANE_COUNT: usize = 3;

/// Index of the overflow/grouping lane.
pub const OVERFLOW_LANE: usize = 2;

/// Geometry callbacks supplied by the rendering collaborator.
///
/// `event_x` must be pan-independent: panning the viewport shifts what is
/// drawn, not where events sit on the board.
pub trait LayoutGeometry {
    /// Center X of one event in board pixels.
    fn event_x(&self, id: EventId) -> f64;
    /// Top Y of one lane in board pixels.
    fn lane_top(&self, lane: usize) -> f64;
}

/// Tunable layout dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Height of every lane in pixels.
    pub lane_height: f64,
    /// Minimum rectangle width assigned to an event.
    pub min_width_px: f64,
    /// Margin kept between a group's bounds and its absorbed rectangles.
    pub group_padding_px: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            lane_height: 48.0,
            min_width_px: 120.0,
            group_padding_px: 8.0,
        }
    }
}

/// Board coordinates of one placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// What a placement record stands for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementKind {
    /// One input event.
    Event(EventId),
    /// A synthetic group placeholder.
    Group(String),
}

/// One output record of a layout pass. Transient, recomputed per pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub kind: PlacementKind,
    pub title: String,
    /// Source position for event placements; `None` for groups.
    pub start_ms: Option<i64>,
    pub lane: usize,
    /// Adjusted center-X / top-Y position in board pixels.
    pub position: Point,
    pub width_px: f64,
    /// True when a group placeholder replaces this event visually.
    #[serde(default)]
    pub hidden_by_group: bool,
    pub color: Option<String>,
}

/// A synthetic placeholder absorbing overlapping overflow events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneGroup {
    /// Deterministic per-pass id (creation bounds + sequence number).
    pub id: String,
    pub lane: usize,
    pub x1: f64,
    pub x2: f64,
    pub y: f64,
    pub height: f64,
    /// Ids of the absorbed events. Only grows within a pass.
    pub event_ids: BTreeSet<EventId>,
}

/// Result of one layout pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutOutput {
    /// One record per input event plus one per surviving group.
    pub placements: Vec<Placement>,
    /// Surviving groups with their final bounds and membership.
    pub groups: Vec<LaneGroup>,
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    x1: f64,
    x2: f64,
}

impl Rect {
    fn centered(center: f64, width: f64) -> Self {
        Self {
            x1: center - width / 2.0,
            x2: center + width / 2.0,
        }
    }

    fn overlaps(&self, other: &Rect) -> bool {
        !(self.x2 <= other.x1 || other.x2 <= self.x1)
    }
}

/// An ungrouped occupant of the overflow lane.
struct OverflowSlot {
    rect: Rect,
    event_id: EventId,
    /// Index of the occupant's record in the placement list.
    placement_index: usize,
}

/// Places `events` into lanes and collapses overflow collisions.
///
/// Events are processed in ascending `event_x` order; the sort is stable,
/// so equal-X events keep their input order. Lanes 0 and 1 are tried
/// first; lane 2 absorbs whatever collides there into groups. Non-finite
/// X values are not guarded: they flow into degenerate placements without
/// failing the pass.
///
/// The pass never mutates `events` and is idempotent for identical inputs,
/// group ids included.
pub fn layout_events(
    events: &[TimelineEvent],
    geometry: &impl LayoutGeometry,
    config: &LayoutConfig,
) -> LayoutOutput {
    let mut ordered: Vec<(f64, &TimelineEvent)> = events
        .iter()
        .map(|event| (geometry.event_x(event.uuid), event))
        .collect();
    ordered.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut placements: Vec<Placement> = Vec::new();
    let mut groups: Vec<LaneGroup> = Vec::new();
    // Standalone occupancy for lanes 0 and 1.
    let mut solo_lanes: [Vec<Rect>; 2] = [Vec::new(), Vec::new()];
    // Ungrouped occupants of lane 2; removed once absorbed into a group.
    let mut overflow_slots: Vec<OverflowSlot> = Vec::new();

    for (x, event) in ordered {
        let width = event
            .width_px
            .unwrap_or(config.min_width_px)
            .max(config.min_width_px);
        let candidate = Rect::centered(x, width);

        let mut placement = Placement {
            kind: PlacementKind::Event(event.uuid),
            title: event.title.clone(),
            start_ms: Some(event.start_ms),
            lane: 0,
            position: Point { x, y: 0.0 },
            width_px: width,
            hidden_by_group: false,
            color: event.color.clone(),
        };

        // Lanes 0 and 1: first lane whose occupancy is clear wins.
        let mut clear_lane = None;
        for lane in 0..OVERFLOW_LANE {
            if solo_lanes[lane].iter().any(|rect| rect.overlaps(&candidate)) {
                continue;
            }
            clear_lane = Some(lane);
            break;
        }
        if let Some(lane) = clear_lane {
            solo_lanes[lane].push(candidate);
            placement.lane = lane;
            placement.position.y = geometry.lane_top(lane);
            placements.push(placement);
            continue;
        }

        placement.lane = OVERFLOW_LANE;
        placement.position.y = geometry.lane_top(OVERFLOW_LANE);

        // Existing group first: absorb and widen its bounds.
        if let Some(group) = groups.iter_mut().find(|group| {
            Rect {
                x1: group.x1,
                x2: group.x2,
            }
            .overlaps(&candidate)
        }) {
            group.event_ids.insert(event.uuid);
            group.x1 = group.x1.min(candidate.x1 - config.group_padding_px);
            group.x2 = group.x2.max(candidate.x2 + config.group_padding_px);
            placement.hidden_by_group = true;
            placements.push(placement);
            continue;
        }

        // Ungrouped lane-2 occupant: seed a fresh group around both
        // rectangles. Leaving the occupant standalone would double-count
        // it against the conservation invariant.
        if let Some(slot_index) = overflow_slots
            .iter()
            .position(|slot| slot.rect.overlaps(&candidate))
        {
            let slot = overflow_slots.swap_remove(slot_index);
            placements[slot.placement_index].hidden_by_group = true;

            let x1 = slot.rect.x1.min(candidate.x1) - config.group_padding_px;
            let x2 = slot.rect.x2.max(candidate.x2) + config.group_padding_px;
            let mut event_ids = BTreeSet::new();
            event_ids.insert(slot.event_id);
            event_ids.insert(event.uuid);
            groups.push(LaneGroup {
                id: group_id(groups.len(), x1, x2),
                lane: OVERFLOW_LANE,
                x1,
                x2,
                y: geometry.lane_top(OVERFLOW_LANE),
                height: config.lane_height,
                event_ids,
            });

            placement.hidden_by_group = true;
            placements.push(placement);
            continue;
        }

        // Clear overflow lane: standalone lane-2 placement. Degenerate
        // rectangles (NaN X) fail the ordering check and fall through.
        if candidate.x1 <= candidate.x2 {
            overflow_slots.push(OverflowSlot {
                rect: candidate,
                event_id: event.uuid,
                placement_index: placements.len(),
            });
            placements.push(placement);
            continue;
        }

        // Defensive fallback: force a single-member group.
        let x1 = candidate.x1 - config.group_padding_px;
        let x2 = candidate.x2 + config.group_padding_px;
        let mut event_ids = BTreeSet::new();
        event_ids.insert(event.uuid);
        groups.push(LaneGroup {
            id: group_id(groups.len(), x1, x2),
            lane: OVERFLOW_LANE,
            x1,
            x2,
            y: geometry.lane_top(OVERFLOW_LANE),
            height: config.lane_height,
            event_ids,
        });
        placement.hidden_by_group = true;
        placements.push(placement);
    }

    for group in &groups {
        placements.push(Placement {
            kind: PlacementKind::Group(group.id.clone()),
            title: format!("+{}件", group.event_ids.len()),
            start_ms: None,
            lane: OVERFLOW_LANE,
            position: Point {
                x: (group.x1 + group.x2) / 2.0,
                y: group.y,
            },
            width_px: group.x2 - group.x1,
            hidden_by_group: false,
            color: None,
        });
    }

    LayoutOutput { placements, groups }
}

fn group_id(sequence: usize, x1: f64, x2: f64) -> String {
    format!("g{sequence}-{}x{}", x1.round(), x2.round())
}
