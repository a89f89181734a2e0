use chronoboard_core::{
    layout_events, EventGeometry, LayoutConfig, LayoutGeometry, LayoutOutput, PlacementKind,
    TimeScale, TimelineEvent, DAY_MS, OVERFLOW_LANE,
};
use std::collections::HashMap;

struct FixedGeometry {
    xs: HashMap<chronoboard_core::EventId, f64>,
}

impl FixedGeometry {
    fn new(events: &[(f64, &TimelineEvent)]) -> Self {
        Self {
            xs: events.iter().map(|(x, event)| (event.uuid, *x)).collect(),
        }
    }
}

impl LayoutGeometry for FixedGeometry {
    fn event_x(&self, id: chronoboard_core::EventId) -> f64 {
        self.xs.get(&id).copied().unwrap_or(f64::NAN)
    }

    fn lane_top(&self, lane: usize) -> f64 {
        10.0 + lane as f64 * 60.0
    }
}

fn config() -> LayoutConfig {
    LayoutConfig {
        lane_height: 48.0,
        min_width_px: 100.0,
        group_padding_px: 8.0,
    }
}

fn events_at(xs: &[f64]) -> (Vec<TimelineEvent>, FixedGeometry) {
    let events: Vec<TimelineEvent> = xs
        .iter()
        .enumerate()
        .map(|(index, _)| TimelineEvent::new(format!("event {index}"), index as i64))
        .collect();
    let pairs: Vec<(f64, &TimelineEvent)> = xs
        .iter()
        .copied()
        .zip(events.iter())
        .map(|(x, event)| (x, event))
        .collect();
    let geometry = FixedGeometry::new(&pairs);
    (events, geometry)
}

fn standalone_count(output: &LayoutOutput) -> usize {
    output
        .placements
        .iter()
        .filter(|placement| {
            matches!(placement.kind, PlacementKind::Event(_)) && !placement.hidden_by_group
        })
        .count()
}

fn hidden_count(output: &LayoutOutput) -> usize {
    output
        .placements
        .iter()
        .filter(|placement| placement.hidden_by_group)
        .count()
}

#[test]
fn zero_events_yield_empty_output() {
    let (events, geometry) = events_at(&[]);
    let output = layout_events(&events, &geometry, &config());
    assert!(output.placements.is_empty());
    assert!(output.groups.is_empty());
}

#[test]
fn single_event_lands_in_lane_zero() {
    let (events, geometry) = events_at(&[500.0]);
    let output = layout_events(&events, &geometry, &config());

    assert_eq!(output.placements.len(), 1);
    assert!(output.groups.is_empty());
    let placement = &output.placements[0];
    assert_eq!(placement.lane, 0);
    assert!(!placement.hidden_by_group);
    assert_eq!(placement.position.x, 500.0);
    assert_eq!(placement.position.y, 10.0);
    assert_eq!(placement.width_px, 100.0);
}

#[test]
fn non_overlapping_events_all_stay_standalone() {
    let (events, geometry) = events_at(&[0.0, 200.0, 400.0, 600.0]);
    let output = layout_events(&events, &geometry, &config());

    assert!(output.groups.is_empty());
    assert_eq!(standalone_count(&output), 4);
    assert!(output
        .placements
        .iter()
        .all(|placement| placement.lane == 0));
}

#[test]
fn colliding_events_cascade_through_lanes_before_grouping() {
    let (events, geometry) = events_at(&[100.0, 100.0, 100.0]);
    let output = layout_events(&events, &geometry, &config());

    assert!(output.groups.is_empty());
    let lanes: Vec<usize> = output
        .placements
        .iter()
        .map(|placement| placement.lane)
        .collect();
    assert_eq!(lanes, vec![0, 1, 2]);
    assert_eq!(standalone_count(&output), 3);
}

#[test]
fn fourth_collision_seeds_a_group_absorbing_both_overflow_events() {
    let (events, geometry) = events_at(&[100.0, 100.0, 100.0, 100.0]);
    let output = layout_events(&events, &geometry, &config());

    assert_eq!(output.groups.len(), 1);
    let group = &output.groups[0];
    assert_eq!(group.lane, OVERFLOW_LANE);
    assert_eq!(group.event_ids.len(), 2);
    // Both members were placed at 100 with width 100: rects 50..150.
    assert_eq!(group.x1, 42.0);
    assert_eq!(group.x2, 158.0);
    assert!(group.event_ids.contains(&events[2].uuid));
    assert!(group.event_ids.contains(&events[3].uuid));

    let group_placement = output
        .placements
        .iter()
        .find(|placement| matches!(placement.kind, PlacementKind::Group(_)))
        .unwrap();
    assert_eq!(group_placement.title, "+2件");
    assert_eq!(group_placement.lane, OVERFLOW_LANE);
    assert_eq!(group_placement.position.x, 100.0);
    assert_eq!(group_placement.width_px, 116.0);
}

#[test]
fn later_collisions_are_absorbed_into_the_existing_group() {
    let (events, geometry) = events_at(&[100.0, 100.0, 100.0, 100.0, 120.0]);
    let output = layout_events(&events, &geometry, &config());

    assert_eq!(output.groups.len(), 1);
    let group = &output.groups[0];
    assert_eq!(group.event_ids.len(), 3);
    // Absorbed rects span 50..170; bounds keep the 8px padding.
    assert_eq!(group.x1, 42.0);
    assert_eq!(group.x2, 178.0);

    let group_placement = output
        .placements
        .iter()
        .find(|placement| matches!(placement.kind, PlacementKind::Group(_)))
        .unwrap();
    assert_eq!(group_placement.title, "+3件");
}

#[test]
fn every_input_event_appears_exactly_once() {
    let (events, geometry) =
        events_at(&[0.0, 10.0, 20.0, 30.0, 40.0, 300.0, 305.0, 600.0]);
    let output = layout_events(&events, &geometry, &config());

    let event_records = output
        .placements
        .iter()
        .filter(|placement| matches!(placement.kind, PlacementKind::Event(_)))
        .count();
    assert_eq!(event_records, events.len());

    let grouped: usize = output
        .groups
        .iter()
        .map(|group| group.event_ids.len())
        .sum();
    assert_eq!(grouped, hidden_count(&output));
    assert_eq!(standalone_count(&output) + grouped, events.len());
}

#[test]
fn group_bounds_track_absorbed_rectangles_with_padding() {
    let (events, geometry) =
        events_at(&[0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
    let cfg = config();
    let output = layout_events(&events, &geometry, &cfg);

    for group in &output.groups {
        let xs: Vec<f64> = events
            .iter()
            .filter(|event| group.event_ids.contains(&event.uuid))
            .map(|event| geometry.event_x(event.uuid))
            .collect();
        let min_x1 = xs
            .iter()
            .map(|x| x - cfg.min_width_px / 2.0)
            .fold(f64::INFINITY, f64::min);
        let max_x2 = xs
            .iter()
            .map(|x| x + cfg.min_width_px / 2.0)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(group.x1, min_x1 - cfg.group_padding_px);
        assert_eq!(group.x2, max_x2 + cfg.group_padding_px);
        assert!(group.x1 <= group.x2);
    }
}

#[test]
fn repeated_passes_produce_identical_output() {
    let (events, geometry) =
        events_at(&[0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 400.0, 401.0]);
    let cfg = config();

    let first = layout_events(&events, &geometry, &cfg);
    let second = layout_events(&events, &geometry, &cfg);
    assert_eq!(first, second);

    let first_ids: Vec<&str> = first.groups.iter().map(|group| group.id.as_str()).collect();
    let second_ids: Vec<&str> = second.groups.iter().map(|group| group.id.as_str()).collect();
    assert_eq!(first_ids, second_ids);
}

#[test]
fn explicit_widths_are_raised_to_the_configured_minimum() {
    let (mut events, geometry) = events_at(&[100.0, 400.0]);
    events[0].width_px = Some(20.0);
    events[1].width_px = Some(250.0);
    let output = layout_events(&events, &geometry, &config());

    assert_eq!(output.placements[0].width_px, 100.0);
    assert_eq!(output.placements[1].width_px, 250.0);
}

#[test]
fn inputs_are_not_mutated_by_a_pass() {
    let (events, geometry) = events_at(&[100.0, 100.0, 100.0, 100.0]);
    let snapshot = events.clone();
    let _ = layout_events(&events, &geometry, &config());
    assert_eq!(events, snapshot);
}

#[test]
fn layout_is_pan_independent_through_the_time_scale() {
    let mut events: Vec<TimelineEvent> = (0..4i64)
        .map(|index| TimelineEvent::new(format!("day {index}"), index * DAY_MS))
        .collect();
    events.push(TimelineEvent::new("dup", 0));

    let mut scale = TimeScale::new(0, 64.0);
    let before = {
        let geometry = EventGeometry::new(&scale, &events);
        layout_events(&events, &geometry, &config())
    };

    scale.pan_by(500.0);
    let after = {
        let geometry = EventGeometry::new(&scale, &events);
        layout_events(&events, &geometry, &config())
    };

    assert_eq!(before, after);
}
