//! Non-overlapping placement of new nodes.

use super::position::Position;

/// Width of a node's footprint on the canvas.
pub const NODE_WIDTH: f32 = 240.0;

/// Height of a node's footprint on the canvas.
pub const NODE_HEIGHT: f32 = 80.0;

/// Horizontal distance between two probes.
pub const HORIZONTAL_STEP: f32 = 260.0;

/// Vertical distance between two probe rows.
pub const VERTICAL_STEP: f32 = 100.0;

/// Probes tried on one row before moving up a row.
pub const PROBES_PER_ROW: usize = 5;

/// Upper bound on probes, the requested position included.
pub const MAX_ATTEMPTS: usize = 50;

/// Outcome of a placement search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Chosen position.
    pub position: Position,
    /// Number of probes evaluated.
    pub attempts: usize,
    /// Whether the chosen position is free of overlap.
    pub is_free: bool,
}

/// Returns whether two node footprints anchored at `a` and `b` overlap.
///
/// Footprints that only touch along an edge do not overlap.
pub fn overlaps(a: Position, b: Position) -> bool {
    a.x < b.x + NODE_WIDTH
        && a.x + NODE_WIDTH > b.x
        && a.y < b.y + NODE_HEIGHT
        && a.y + NODE_HEIGHT > b.y
}

/// Finds a position near `requested` whose footprint overlaps no existing node.
///
/// Probes walk right along a row in [`HORIZONTAL_STEP`] increments; after
/// [`PROBES_PER_ROW`] probes the walk restarts at the requested x one
/// [`VERTICAL_STEP`] higher. Overlap is a soft constraint: when
/// [`MAX_ATTEMPTS`] probes all collide, the last probe is returned with
/// `is_free == false`.
pub fn place(existing: &[Position], requested: Position) -> Placement {
    let mut candidate = requested;

    for attempt in 0..MAX_ATTEMPTS {
        let column = attempt % PROBES_PER_ROW;
        let row = attempt / PROBES_PER_ROW;
        candidate = requested.offset(
            column as f32 * HORIZONTAL_STEP,
            -(row as f32) * VERTICAL_STEP,
        );

        if existing.iter().all(|other| !overlaps(candidate, *other)) {
            return Placement {
                position: candidate,
                attempts: attempt + 1,
                is_free: true,
            };
        }
    }

    Placement {
        position: candidate,
        attempts: MAX_ATTEMPTS,
        is_free: false,
    }
}

/// Convenience wrapper around [`place`] that returns only the position.
pub fn find_free_position(existing: &[Position], requested: Position) -> Position {
    place(existing, requested).position
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_canvas_keeps_requested() {
        let placement = place(&[], Position::new(12.0, 34.0));
        assert_eq!(placement.position, Position::new(12.0, 34.0));
        assert_eq!(placement.attempts, 1);
        assert!(placement.is_free);
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = Position::new(0.0, 0.0);
        assert!(!overlaps(a, Position::new(NODE_WIDTH, 0.0)));
        assert!(!overlaps(a, Position::new(0.0, NODE_HEIGHT)));
        assert!(overlaps(a, Position::new(NODE_WIDTH - 1.0, NODE_HEIGHT - 1.0)));
    }

    #[test]
    fn test_bounding_box_not_distance() {
        // Far apart on y but within the footprint width on x.
        let a = Position::new(0.0, 0.0);
        assert!(!overlaps(a, Position::new(10.0, 200.0)));
        // Diagonal neighbour whose boxes intersect.
        assert!(overlaps(a, Position::new(200.0, 60.0)));
    }

    #[test]
    fn test_steps_right_when_occupied() {
        let existing = [Position::new(0.0, 0.0)];
        let placement = place(&existing, Position::new(0.0, 0.0));

        assert_eq!(placement.position, Position::new(HORIZONTAL_STEP, 0.0));
        assert_eq!(placement.attempts, 2);
    }

    #[test]
    fn test_moves_up_a_row_after_full_row() {
        let existing: Vec<_> = (0..PROBES_PER_ROW)
            .map(|i| Position::new(i as f32 * HORIZONTAL_STEP, 0.0))
            .collect();
        let placement = place(&existing, Position::new(0.0, 0.0));

        assert_eq!(placement.position, Position::new(0.0, -VERTICAL_STEP));
        assert!(placement.is_free);
    }

    #[test]
    fn test_gives_up_after_budget() {
        let mut existing = Vec::new();
        for row in 0..=(MAX_ATTEMPTS / PROBES_PER_ROW) {
            for column in 0..PROBES_PER_ROW {
                existing.push(Position::new(
                    column as f32 * HORIZONTAL_STEP,
                    -(row as f32) * VERTICAL_STEP,
                ));
            }
        }

        let placement = place(&existing, Position::new(0.0, 0.0));
        assert!(!placement.is_free);
        assert_eq!(placement.attempts, MAX_ATTEMPTS);

        let last_row = ((MAX_ATTEMPTS - 1) / PROBES_PER_ROW) as f32;
        let last_column = ((MAX_ATTEMPTS - 1) % PROBES_PER_ROW) as f32;
        assert_eq!(
            placement.position,
            Position::new(last_column * HORIZONTAL_STEP, -last_row * VERTICAL_STEP)
        );
    }

    #[test]
    fn test_result_is_free_or_budget_exhausted() {
        let existing = [
            Position::new(0.0, 0.0),
            Position::new(130.0, 40.0),
            Position::new(520.0, -100.0),
            Position::new(-50.0, -90.0),
        ];

        for (x, y) in [(0.0, 0.0), (100.0, 30.0), (500.0, -80.0), (-1000.0, 1000.0)] {
            let placement = place(&existing, Position::new(x, y));
            let free = existing.iter().all(|e| !overlaps(placement.position, *e));
            assert!(free || placement.attempts == MAX_ATTEMPTS);
            assert_eq!(free, placement.is_free);
        }
    }
}
