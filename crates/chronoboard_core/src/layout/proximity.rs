//! Cheap proximity predicate for interactive grouping hints.
//!
//! # Responsibility
//! - Decide whether two events read as "close enough to group" while the
//!   user is dragging, without running a full layout pass.
//!
//! # Invariants
//! - This predicate never feeds the lane engine; authoritative placement
//!   uses the strict rectangle overlap test in [`crate::layout::lanes`].

/// Extra slack added to edge comparisons, in pixels.
pub const EDGE_MARGIN_PX: f64 = 10.0;

/// Default center-to-center grouping distance, in pixels.
pub const DEFAULT_GROUP_DISTANCE_PX: f64 = 80.0;

/// Returns whether two events are close enough to suggest grouping.
///
/// True when the events' edges (`center ± width / 2`) overlap within
/// [`EDGE_MARGIN_PX`], or when the center distance is below `threshold`.
pub fn should_group_events(
    a_center: f64,
    a_width: f64,
    b_center: f64,
    b_width: f64,
    threshold: f64,
) -> bool {
    let a_left = a_center - a_width / 2.0;
    let a_right = a_center + a_width / 2.0;
    let b_left = b_center - b_width / 2.0;
    let b_right = b_center + b_width / 2.0;

    let edges_overlap =
        a_left < b_right + EDGE_MARGIN_PX && b_left < a_right + EDGE_MARGIN_PX;
    let centers_close = (a_center - b_center).abs() < threshold;

    edges_overlap || centers_close
}

#[cfg(test)]
mod tests {
    use super::{should_group_events, DEFAULT_GROUP_DISTANCE_PX};

    #[test]
    fn overlapping_edges_group() {
        assert!(should_group_events(
            100.0,
            60.0,
            150.0,
            60.0,
            DEFAULT_GROUP_DISTANCE_PX
        ));
    }

    #[test]
    fn edge_margin_extends_overlap() {
        // Edges 30..=130 and 139..=239: separated by 9px, inside the 10px margin.
        assert!(should_group_events(80.0, 100.0, 189.0, 100.0, 0.0));
        // Separated by 11px: outside the margin and the zero threshold.
        assert!(!should_group_events(80.0, 100.0, 191.0, 100.0, 0.0));
    }

    #[test]
    fn close_centers_group_even_without_edge_overlap() {
        // Two 4px-wide events 50px apart: no edge contact, centers close.
        assert!(should_group_events(
            0.0,
            4.0,
            50.0,
            4.0,
            DEFAULT_GROUP_DISTANCE_PX
        ));
        assert!(!should_group_events(0.0, 4.0, 50.0, 4.0, 40.0));
    }
}
