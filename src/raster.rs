use std::path::Path;

use image::{DynamicImage, GrayImage, ImageError, ImageReader, Luma, Rgb, RgbImage};
use imageproc::filter::gaussian_blur_f32;
use ndarray::Array2;

use crate::color::unit_to_u8;
use crate::{VectraError, VectraResult};

/// Channel layout carried through every stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelSpace {
    Grayscale,
    Rgb,
}

/// A `height × width` grid of samples normalized to [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub enum RasterImage {
    Grayscale(Array2<f64>),
    Rgb(Array2<[f64; 3]>),
}

impl RasterImage {
    pub fn space(&self) -> PixelSpace {
        match self {
            RasterImage::Grayscale(_) => PixelSpace::Grayscale,
            RasterImage::Rgb(_) => PixelSpace::Rgb,
        }
    }

    /// `(height, width)` of the grid.
    pub fn dim(&self) -> (usize, usize) {
        match self {
            RasterImage::Grayscale(pixels) => pixels.dim(),
            RasterImage::Rgb(pixels) => pixels.dim(),
        }
    }

    pub fn height(&self) -> usize {
        self.dim().0
    }

    pub fn width(&self) -> usize {
        self.dim().1
    }

    /// Normalize a decoded image.
    ///
    /// Alpha is flattened over a white background, grayscale stays single
    /// channel, integer samples are scaled by their native maximum and float
    /// samples are clamped.
    pub fn from_dynamic(image: &DynamicImage) -> VectraResult<Self> {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let raster = match image {
            DynamicImage::ImageLuma8(buffer) => {
                RasterImage::Grayscale(gray_from_raw(buffer.as_raw(), w, h, u8_to_unit))
            }
            DynamicImage::ImageLuma16(buffer) => {
                RasterImage::Grayscale(gray_from_raw(buffer.as_raw(), w, h, u16_to_unit))
            }
            DynamicImage::ImageRgb8(buffer) => {
                RasterImage::Rgb(rgb_from_raw(buffer.as_raw(), w, h, 3, u8_to_unit))
            }
            DynamicImage::ImageRgb16(buffer) => {
                RasterImage::Rgb(rgb_from_raw(buffer.as_raw(), w, h, 3, u16_to_unit))
            }
            DynamicImage::ImageRgb32F(buffer) => {
                RasterImage::Rgb(rgb_from_raw(buffer.as_raw(), w, h, 3, f32_to_unit))
            }
            DynamicImage::ImageRgba8(buffer) => {
                RasterImage::Rgb(rgb_from_raw(buffer.as_raw(), w, h, 4, u8_to_unit))
            }
            DynamicImage::ImageRgba16(buffer) => {
                RasterImage::Rgb(rgb_from_raw(buffer.as_raw(), w, h, 4, u16_to_unit))
            }
            DynamicImage::ImageRgba32F(buffer) => {
                RasterImage::Rgb(rgb_from_raw(buffer.as_raw(), w, h, 4, f32_to_unit))
            }
            other => {
                return Err(VectraError::UnsupportedImageShape {
                    channels: other.color().channel_count(),
                });
            }
        };
        Ok(raster)
    }

    /// Gaussian-smooth the samples at 8-bit precision.
    pub fn blurred(&self, sigma: f32) -> Self {
        let (h, w) = self.dim();
        match self {
            RasterImage::Grayscale(pixels) => {
                let image = GrayImage::from_fn(w as u32, h as u32, |x, y| {
                    Luma([unit_to_u8(pixels[[y as usize, x as usize]])])
                });
                let smoothed = gaussian_blur_f32(&image, sigma);
                RasterImage::Grayscale(gray_from_raw(smoothed.as_raw(), w, h, u8_to_unit))
            }
            RasterImage::Rgb(pixels) => {
                let image = RgbImage::from_fn(w as u32, h as u32, |x, y| {
                    Rgb(pixels[[y as usize, x as usize]].map(unit_to_u8))
                });
                let smoothed = gaussian_blur_f32(&image, sigma);
                RasterImage::Rgb(rgb_from_raw(smoothed.as_raw(), w, h, 3, u8_to_unit))
            }
        }
    }
}

/// Read and normalize the raster file at `path`.
pub fn load_raster(path: &Path) -> VectraResult<RasterImage> {
    let read_error = |source: ImageError| VectraError::ImageRead {
        path: path.to_path_buf(),
        source,
    };
    let decoded = ImageReader::open(path)
        .map_err(|e| read_error(ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| read_error(ImageError::IoError(e)))?
        .decode()
        .map_err(read_error)?;
    RasterImage::from_dynamic(&decoded)
}

fn u8_to_unit(value: u8) -> f64 {
    f64::from(value) / f64::from(u8::MAX)
}

fn u16_to_unit(value: u16) -> f64 {
    f64::from(value) / f64::from(u16::MAX)
}

fn f32_to_unit(value: f32) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        f64::from(value).clamp(0.0, 1.0)
    }
}

fn gray_from_raw<T: Copy>(raw: &[T], w: usize, h: usize, to_unit: fn(T) -> f64) -> Array2<f64> {
    Array2::from_shape_fn((h, w), |(y, x)| to_unit(raw[y * w + x]))
}

/// Build an RGB grid from interleaved samples; a fourth channel is treated as
/// alpha and composited over white.
fn rgb_from_raw<T: Copy>(
    raw: &[T],
    w: usize,
    h: usize,
    channels: usize,
    to_unit: fn(T) -> f64,
) -> Array2<[f64; 3]> {
    Array2::from_shape_fn((h, w), |(y, x)| {
        let base = (y * w + x) * channels;
        let rgb = [
            to_unit(raw[base]),
            to_unit(raw[base + 1]),
            to_unit(raw[base + 2]),
        ];
        if channels == 4 {
            let alpha = to_unit(raw[base + 3]);
            rgb.map(|c| c * alpha + (1.0 - alpha))
        } else {
            rgb
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayAlphaImage, ImageBuffer, LumaA, Rgba, RgbaImage};

    mod from_dynamic {
        use super::*;

        mod unit {
            use super::*;

            #[test]
            fn rgb8_scaled_to_unit_range() {
                let mut rgb = RgbImage::new(2, 1);
                rgb.put_pixel(0, 0, Rgb([255, 0, 51]));
                rgb.put_pixel(1, 0, Rgb([0, 255, 0]));
                let raster = RasterImage::from_dynamic(&DynamicImage::ImageRgb8(rgb)).unwrap();

                assert_eq!(raster.space(), PixelSpace::Rgb);
                assert_eq!(raster.dim(), (1, 2));
                let RasterImage::Rgb(pixels) = raster else {
                    panic!("expected rgb raster");
                };
                assert_eq!(pixels[[0, 0]], [1.0, 0.0, 0.2]);
                assert_eq!(pixels[[0, 1]], [0.0, 1.0, 0.0]);
            }

            #[test]
            fn grayscale_stays_single_channel() {
                let gray = GrayImage::from_pixel(3, 2, Luma([255]));
                let raster = RasterImage::from_dynamic(&DynamicImage::ImageLuma8(gray)).unwrap();
                assert_eq!(raster.space(), PixelSpace::Grayscale);
                assert_eq!(raster.dim(), (2, 3));
            }

            #[test]
            fn sixteen_bit_scaled_by_native_max() {
                let gray: ImageBuffer<Luma<u16>, Vec<u16>> =
                    ImageBuffer::from_pixel(1, 1, Luma([u16::MAX]));
                let raster = RasterImage::from_dynamic(&DynamicImage::ImageLuma16(gray)).unwrap();
                let RasterImage::Grayscale(pixels) = raster else {
                    panic!("expected grayscale raster");
                };
                assert_eq!(pixels[[0, 0]], 1.0);
            }

            #[test]
            fn float_samples_clamped_not_rescaled() {
                let rgb: ImageBuffer<Rgb<f32>, Vec<f32>> =
                    ImageBuffer::from_pixel(1, 1, Rgb([1.5, -0.5, 0.25]));
                let raster = RasterImage::from_dynamic(&DynamicImage::ImageRgb32F(rgb)).unwrap();
                let RasterImage::Rgb(pixels) = raster else {
                    panic!("expected rgb raster");
                };
                assert_eq!(pixels[[0, 0]], [1.0, 0.0, 0.25]);
            }

            #[test]
            fn transparent_pixel_flattens_to_white() {
                let rgba = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 0]));
                let raster = RasterImage::from_dynamic(&DynamicImage::ImageRgba8(rgba)).unwrap();
                let RasterImage::Rgb(pixels) = raster else {
                    panic!("expected rgb raster");
                };
                assert_eq!(pixels[[0, 0]], [1.0, 1.0, 1.0]);
            }

            #[test]
            fn opaque_alpha_keeps_color() {
                let rgba = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255]));
                let raster = RasterImage::from_dynamic(&DynamicImage::ImageRgba8(rgba)).unwrap();
                let RasterImage::Rgb(pixels) = raster else {
                    panic!("expected rgb raster");
                };
                assert_eq!(pixels[[0, 0]], [1.0, 0.0, 0.0]);
            }

            #[test]
            fn gray_alpha_is_unsupported() {
                let la = GrayAlphaImage::from_pixel(2, 2, LumaA([10, 255]));
                let err = RasterImage::from_dynamic(&DynamicImage::ImageLumaA8(la)).unwrap_err();
                match err {
                    VectraError::UnsupportedImageShape { channels } => assert_eq!(channels, 2),
                    other => panic!("unexpected error: {other:?}"),
                }
            }
        }

        mod prop {
            use super::*;
            use proptest::prelude::*;

            proptest! {
                /// from_dynamic: every normalized sample lies within [0, 1]
                #[test]
                fn samples_in_unit_range(
                    w in 1u32..8,
                    h in 1u32..8,
                    r in proptest::num::u8::ANY,
                    g in proptest::num::u8::ANY,
                    b in proptest::num::u8::ANY,
                    a in proptest::num::u8::ANY
                ) {
                    let rgba = RgbaImage::from_pixel(w, h, Rgba([r, g, b, a]));
                    let raster = RasterImage::from_dynamic(&DynamicImage::ImageRgba8(rgba)).unwrap();
                    prop_assert_eq!(raster.dim(), (h as usize, w as usize));
                    let RasterImage::Rgb(pixels) = raster else {
                        panic!("expected rgb raster");
                    };
                    for px in pixels.iter() {
                        for c in px {
                            prop_assert!((0.0..=1.0).contains(c));
                        }
                    }
                }
            }
        }
    }

    mod load_raster {
        use super::*;

        #[test]
        fn missing_file_is_read_error() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("absent.png");
            let err = load_raster(&path).unwrap_err();
            match err {
                VectraError::ImageRead { path: reported, .. } => assert_eq!(reported, path),
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn non_image_file_is_read_error() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("notes.png");
            std::fs::write(&path, b"definitely not a png").unwrap();
            assert!(matches!(
                load_raster(&path),
                Err(VectraError::ImageRead { .. })
            ));
        }

        #[test]
        fn png_round_trip_through_disk() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("pixel.png");
            RgbImage::from_pixel(4, 3, Rgb([0, 0, 255])).save(&path).unwrap();

            let raster = load_raster(&path).unwrap();
            assert_eq!(raster.space(), PixelSpace::Rgb);
            assert_eq!(raster.dim(), (3, 4));
        }
    }

    mod blurred {
        use super::*;

        #[test]
        fn uniform_image_stays_uniform() {
            let raster = RasterImage::Rgb(Array2::from_elem((5, 5), [1.0, 0.0, 0.0]));
            let RasterImage::Rgb(pixels) = raster.blurred(1.0) else {
                panic!("expected rgb raster");
            };
            // one 8-bit step of slack for kernel rounding
            for px in pixels.iter() {
                assert!((px[0] - 1.0).abs() <= 1.0 / 255.0 + 1e-12);
                assert!(px[1] <= 1.0 / 255.0 + 1e-12);
                assert!(px[2] <= 1.0 / 255.0 + 1e-12);
            }
        }

        #[test]
        fn preserves_dimensions_and_space() {
            let raster = RasterImage::Grayscale(Array2::from_shape_fn((4, 6), |(y, x)| {
                if x < 3 && y < 2 { 1.0 } else { 0.0 }
            }));
            let smoothed = raster.blurred(2.0);
            assert_eq!(smoothed.dim(), (4, 6));
            assert_eq!(smoothed.space(), PixelSpace::Grayscale);
            assert_ne!(smoothed, raster);
        }
    }
}
