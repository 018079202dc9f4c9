use image::{GrayImage, Luma};
use ndarray::{Array2, s};
use tracing::debug;

use crate::color::rgb_to_hsv;
use crate::quantize::Palette;
use crate::raster::RasterImage;
use crate::{VectraError, VectraResult};

/// Slack added to every window bound so centers that went through floating
/// point averaging still match the pixels they came from.
const WINDOW_SLACK: f64 = 1e-9;

/// A `height × width` grid of membership flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    cells: Array2<bool>,
}

impl BinaryMask {
    pub fn new(cells: Array2<bool>) -> Self {
        Self { cells }
    }

    pub fn from_fn(height: usize, width: usize, f: impl Fn(usize, usize) -> bool) -> Self {
        Self::new(Array2::from_shape_fn((height, width), |(y, x)| f(y, x)))
    }

    /// `(height, width)` of the mask.
    pub fn dim(&self) -> (usize, usize) {
        self.cells.dim()
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[[row, col]]
    }

    pub fn cells(&self) -> &Array2<bool> {
        &self.cells
    }

    /// Number of `true` cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&v| v).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|&v| v)
    }

    /// Copy of the mask surrounded by a one-cell border of `false`.
    pub fn padded(&self) -> Array2<bool> {
        let (h, w) = self.dim();
        let mut padded = Array2::from_elem((h + 2, w + 2), false);
        padded.slice_mut(s![1..h + 1, 1..w + 1]).assign(&self.cells);
        padded
    }

    /// Render the mask as a black/white image (255 for members).
    pub fn to_gray_image(&self) -> GrayImage {
        let (h, w) = self.dim();
        GrayImage::from_fn(w as u32, h as u32, |x, y| {
            Luma([if self.cells[[y as usize, x as usize]] {
                255
            } else {
                0
            }])
        })
    }
}

/// A non-empty mask and the 0-255 RGB color it is drawn with.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMask {
    pub mask: BinaryMask,
    pub color: [u8; 3],
    /// Index of the originating cluster in the palette.
    pub cluster: usize,
}

/// Masks kept for a palette plus the number dropped for being empty.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskSet {
    pub masks: Vec<ColorMask>,
    pub dropped: usize,
}

/// Clamp `[center - tolerance, center + tolerance]` to [0, 1].
pub fn tolerance_window(center: f64, tolerance: f64) -> (f64, f64) {
    (
        (center - tolerance).clamp(0.0, 1.0),
        (center + tolerance).clamp(0.0, 1.0),
    )
}

fn in_window<const N: usize>(value: &[f64; N], lower: &[f64; N], upper: &[f64; N]) -> bool {
    value
        .iter()
        .zip(lower.iter().zip(upper))
        .all(|(v, (lo, hi))| *v >= lo - WINDOW_SLACK && *v <= hi + WINDOW_SLACK)
}

/// Build one membership mask per cluster.
///
/// RGB images are matched in HSV (every channel within the window around the
/// cluster center converted to HSV); grayscale images on raw intensity. Empty
/// masks are dropped and counted. Hue wrap-around is not special-cased.
pub fn build_masks(image: &RasterImage, palette: &Palette, tolerance: f64) -> VectraResult<MaskSet> {
    let colors = palette.display_colors();
    let candidates: Vec<BinaryMask> = match (image, palette) {
        (RasterImage::Grayscale(pixels), Palette::Grayscale(clusters)) => clusters
            .iter()
            .map(|cluster| {
                let (lo, hi) = tolerance_window(cluster.center[0], tolerance);
                BinaryMask::new(pixels.map(|v| in_window(&[*v], &[lo], &[hi])))
            })
            .collect(),
        (RasterImage::Rgb(pixels), Palette::Rgb(clusters)) => {
            let hsv = pixels.map(|px| rgb_to_hsv(*px));
            clusters
                .iter()
                .map(|cluster| {
                    let center = rgb_to_hsv(cluster.center);
                    let lower = center.map(|c| tolerance_window(c, tolerance).0);
                    let upper = center.map(|c| tolerance_window(c, tolerance).1);
                    BinaryMask::new(hsv.map(|px| in_window(px, &lower, &upper)))
                })
                .collect()
        }
        _ => {
            return Err(VectraError::PixelSpaceMismatch {
                image: image.space(),
                palette: palette.space(),
            });
        }
    };

    let mut masks = Vec::with_capacity(candidates.len());
    let mut dropped = 0;
    for (cluster, (mask, color)) in candidates.into_iter().zip(colors).enumerate() {
        if mask.is_empty() {
            debug!(cluster, ?color, "skipping empty mask");
            dropped += 1;
        } else {
            masks.push(ColorMask {
                mask,
                color,
                cluster,
            });
        }
    }
    Ok(MaskSet { masks, dropped })
}
