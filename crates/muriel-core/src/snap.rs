//! Grid snapping for placing and moving symbols.

use kurbo::Point;

/// Minor grid unit in world pixels. Positions and sizes snap to this.
pub const GRID_SIZE: f64 = 10.0;

/// Every n-th minor line is drawn as a major line.
pub const MAJOR_GRID_EVERY: u32 = 5;

/// Major grid unit in world pixels. Only used for render emphasis.
pub const MAJOR_GRID_SIZE: f64 = GRID_SIZE * MAJOR_GRID_EVERY as f64;

/// Round a single coordinate to the nearest multiple of `grid_size`.
pub fn snap_coord(value: f64, grid_size: f64) -> f64 {
    if grid_size <= 0.0 {
        return value;
    }
    // `+ 0.0` folds -0.0 into 0.0 so snapped points compare cleanly.
    (value / grid_size).round() * grid_size + 0.0
}

/// Snap an `(x, y)` pair to the grid.
pub fn snap(x: f64, y: f64, grid_size: f64) -> (f64, f64) {
    (snap_coord(x, grid_size), snap_coord(y, grid_size))
}

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> Point {
    let (x, y) = snap(point.x, point.y, grid_size);
    Point::new(x, y)
}

/// Snap a length to the grid, never going below one grid unit.
pub fn snap_length(length: f64, grid_size: f64) -> f64 {
    snap_coord(length.abs(), grid_size).max(grid_size)
}

/// Check whether a point sits on a grid intersection.
pub fn is_on_grid(point: Point, grid_size: f64) -> bool {
    snap_to_grid(point, grid_size) == point
}

/// Check whether the grid line at `index` (counted from the sheet origin)
/// is a major line.
pub fn is_major_line(index: u32, major_every: u32) -> bool {
    major_every != 0 && index % major_every == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_snap_to_grid() {
        let p = snap_to_grid(Point::new(123.0, 47.0), GRID_SIZE);
        assert_eq!(p, Point::new(120.0, 50.0));
    }

    #[test]
    fn test_snap_halfway_rounds_up() {
        assert!((snap_coord(15.0, 10.0) - 20.0).abs() < f64::EPSILON);
        assert!((snap_coord(14.9, 10.0) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snap_negative() {
        let (x, y) = snap(-12.0, -3.0, 10.0);
        assert!((x + 10.0).abs() < f64::EPSILON);
        assert_eq!(y, 0.0);
        assert!(y.is_sign_positive());
    }

    #[test]
    fn test_snap_length_minimum() {
        assert!((snap_length(2.0, 10.0) - 10.0).abs() < f64::EPSILON);
        assert!((snap_length(0.0, 10.0) - 10.0).abs() < f64::EPSILON);
        assert!((snap_length(37.0, 10.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_grid_is_identity() {
        assert!((snap_coord(3.3, 0.0) - 3.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_major_lines() {
        assert!(is_major_line(0, MAJOR_GRID_EVERY));
        assert!(!is_major_line(3, MAJOR_GRID_EVERY));
        assert!(is_major_line(10, MAJOR_GRID_EVERY));
        assert!((MAJOR_GRID_SIZE - 50.0).abs() < f64::EPSILON);
    }

    proptest! {
        #[test]
        fn snap_is_idempotent(x in -1.0e5f64..1.0e5, y in -1.0e5f64..1.0e5, grid in 1.0f64..100.0) {
            let once = snap(x, y, grid);
            let twice = snap(once.0, once.1, grid);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn snap_moves_at_most_half_a_cell(x in -1.0e5f64..1.0e5, grid in 1.0f64..100.0) {
            let snapped = snap_coord(x, grid);
            prop_assert!((snapped - x).abs() <= grid / 2.0 + 1e-6);
        }

        #[test]
        fn snapped_points_are_on_grid(x in -1.0e4f64..1.0e4, y in -1.0e4f64..1.0e4) {
            let p = snap_to_grid(Point::new(x, y), GRID_SIZE);
            prop_assert!(is_on_grid(p, GRID_SIZE));
        }
    }
}
