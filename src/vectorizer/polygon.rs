use crate::VectraResult;
use crate::config::DEFAULT_SIMPLIFY_TOLERANCE;
use crate::contour::{ContourSet, extract_contours};
use crate::mask::BinaryMask;

use super::MaskVectorizer;

/// Options for tracing a mask into simplified polygons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonOptions {
    /// Maximum perpendicular deviation, in pixels, allowed when dropping a vertex.
    pub simplify_tolerance: f64,
}

impl Default for PolygonOptions {
    fn default() -> Self {
        Self {
            simplify_tolerance: DEFAULT_SIMPLIFY_TOLERANCE,
        }
    }
}

/// Pixel-edge boundary tracer followed by Douglas-Peucker simplification.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolygonVectorizer;

impl MaskVectorizer for PolygonVectorizer {
    type Options = PolygonOptions;
    type Output = ContourSet;

    fn vectorize(&self, mask: &BinaryMask, options: &Self::Options) -> VectraResult<Self::Output> {
        Ok(trace_to_polygons(mask, options))
    }
}

/// Trace every region of `mask` into simplified closed polygons.
pub fn trace_to_polygons(mask: &BinaryMask, options: &PolygonOptions) -> ContourSet {
    extract_contours(mask, options.simplify_tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectorizer_matches_free_function() {
        let mask = BinaryMask::from_fn(6, 6, |y, x| (1..5).contains(&y) && (2..4).contains(&x));
        let options = PolygonOptions::default();
        let traced = PolygonVectorizer.vectorize(&mask, &options).unwrap();
        assert_eq!(traced, trace_to_polygons(&mask, &options));
        assert_eq!(traced.contours.len(), 1);
        assert_eq!(traced.contours[0].points().len(), 4);
    }

    #[test]
    fn default_tolerance_matches_conversion_default() {
        assert_eq!(PolygonOptions::default().simplify_tolerance, 0.5);
    }
}
