//! Pan/zoom time scale backing the layout geometry seam.
//!
//! # Responsibility
//! - Map epoch-millisecond positions to board X coordinates.
//! - Hold viewport pan/zoom state without leaking it into placement.
//!
//! # Invariants
//! - `event_x` is pan-independent; panning only affects [`TimeScale::screen_x`].
//! - Zoom stays within fixed bounds so the scale never degenerates.

use crate::layout::lanes::LayoutGeometry;
use crate::model::event::{EventId, TimelineEvent};
use std::collections::BTreeMap;

/// Milliseconds per day on the time axis.
pub const DAY_MS: i64 = 86_400_000;

const MIN_PX_PER_DAY: f64 = 2.0;
const MAX_PX_PER_DAY: f64 = 512.0;

/// Linear time-to-pixel mapping with viewport state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    /// Timestamp mapped to board X zero.
    pub origin_ms: i64,
    /// Horizontal zoom factor.
    pub px_per_day: f64,
    /// Viewport pan offset applied at draw time only.
    pub pan_px: f64,
    /// Top Y of lane 0.
    pub top_px: f64,
    /// Height of one lane.
    pub lane_height: f64,
    /// Vertical gap between lanes.
    pub lane_gap: f64,
}

impl TimeScale {
    /// Creates a scale anchored at `origin_ms`.
    pub fn new(origin_ms: i64, px_per_day: f64) -> Self {
        Self {
            origin_ms,
            px_per_day: px_per_day.clamp(MIN_PX_PER_DAY, MAX_PX_PER_DAY),
            pan_px: 0.0,
            top_px: 0.0,
            lane_height: 48.0,
            lane_gap: 8.0,
        }
    }

    /// Board X for a timestamp, independent of pan.
    pub fn x_for_ms(&self, ms: i64) -> f64 {
        (ms - self.origin_ms) as f64 / DAY_MS as f64 * self.px_per_day
    }

    /// Screen X for a timestamp with the current pan applied.
    pub fn screen_x(&self, ms: i64) -> f64 {
        self.x_for_ms(ms) - self.pan_px
    }

    /// Shifts the viewport by `delta_px`.
    pub fn pan_by(&mut self, delta_px: f64) {
        self.pan_px += delta_px;
    }

    /// Doubles the zoom factor up to the fixed maximum.
    pub fn zoom_in(&mut self) {
        self.px_per_day = (self.px_per_day * 2.0).min(MAX_PX_PER_DAY);
    }

    /// Halves the zoom factor down to the fixed minimum.
    pub fn zoom_out(&mut self) {
        self.px_per_day = (self.px_per_day / 2.0).max(MIN_PX_PER_DAY);
    }
}

/// [`LayoutGeometry`] over a concrete event set and scale.
///
/// Unknown event ids resolve to NaN, which the lane engine accepts as a
/// degenerate placement rather than an error.
pub struct EventGeometry<'a> {
    scale: &'a TimeScale,
    starts: BTreeMap<EventId, i64>,
}

impl<'a> EventGeometry<'a> {
    /// Indexes `events` for X lookups against `scale`.
    pub fn new(scale: &'a TimeScale, events: &[TimelineEvent]) -> Self {
        Self {
            scale,
            starts: events
                .iter()
                .map(|event| (event.uuid, event.start_ms))
                .collect(),
        }
    }
}

impl LayoutGeometry for EventGeometry<'_> {
    fn event_x(&self, id: EventId) -> f64 {
        match self.starts.get(&id) {
            Some(start_ms) => self.scale.x_for_ms(*start_ms),
            None => f64::NAN,
        }
    }

    fn lane_top(&self, lane: usize) -> f64 {
        self.scale.top_px + lane as f64 * (self.scale.lane_height + self.scale.lane_gap)
    }
}
