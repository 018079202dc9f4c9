use super::{Contour, Point};

/// Distance from `p` to the line through `a` and `b`, or to `a` when the two
/// coincide.
fn deviation(p: Point, a: Point, b: Point) -> f64 {
    let (dr, dc) = (b.row - a.row, b.col - a.col);
    let length = dr.hypot(dc);
    if length == 0.0 {
        return (p.row - a.row).hypot(p.col - a.col);
    }
    ((p.row - a.row) * dc - (p.col - a.col) * dr).abs() / length
}

/// Douglas-Peucker polyline simplification.
///
/// Both endpoints are always kept. An intermediate point survives when it
/// deviates from the current chord by more than `tolerance`.
pub fn douglas_peucker(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut pending = vec![(0, last)];
    while let Some((start, end)) = pending.pop() {
        if end <= start + 1 {
            continue;
        }
        let (index, distance) = (start + 1..end)
            .map(|i| (i, deviation(points[i], points[start], points[end])))
            .fold((start, -1.0), |best, candidate| {
                if candidate.1 > best.1 { candidate } else { best }
            });
        if distance > tolerance {
            keep[index] = true;
            pending.push((index, end));
            pending.push((start, index));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

/// Simplify a closed ring (first point repeated at the end) into a contour.
///
/// Returns `None` when fewer than three distinct points survive.
pub fn simplify_ring(ring: &[Point], tolerance: f64) -> Option<Contour> {
    Contour::new(douglas_peucker(ring, tolerance))
}
