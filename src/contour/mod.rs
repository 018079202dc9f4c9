//! Boundary tracing and polygon simplification for binary masks.

mod march;
mod simplify;

pub use march::trace_boundaries;
pub use simplify::{douglas_peucker, simplify_ring};

use tracing::debug;

use crate::mask::BinaryMask;

/// A point in image space. Pixel `(r, c)` covers `[r, r + 1] × [c, c + 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub row: f64,
    pub col: f64,
}

impl Point {
    pub fn new(row: f64, col: f64) -> Self {
        Self { row, col }
    }
}

/// A closed polygon with at least three points and no repeated neighbours.
///
/// The closing edge from the last point back to the first is implicit.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    points: Vec<Point>,
}

impl Contour {
    /// Build a contour, collapsing consecutive duplicates (including the
    /// wrap-around pair). Returns `None` when fewer than three points remain.
    pub fn new(mut points: Vec<Point>) -> Option<Self> {
        points.dedup();
        while points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        (points.len() >= 3).then_some(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

/// Contours kept for one mask plus bookkeeping on what was discarded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourSet {
    pub contours: Vec<Contour>,
    /// Boundaries found before simplification.
    pub traced: usize,
    /// Boundaries that collapsed below three points.
    pub dropped: usize,
}

/// Trace every boundary of `mask` and simplify it with `simplify_tolerance`.
pub fn extract_contours(mask: &BinaryMask, simplify_tolerance: f64) -> ContourSet {
    let rings = trace_boundaries(mask);
    let traced = rings.len();
    let contours: Vec<Contour> = rings
        .iter()
        .filter_map(|ring| simplify_ring(ring, simplify_tolerance))
        .collect();
    let dropped = traced - contours.len();
    if dropped > 0 {
        debug!(traced, dropped, simplify_tolerance, "discarded degenerate contours");
    }
    ContourSet {
        contours,
        traced,
        dropped,
    }
}
