pub mod color;
pub mod config;
pub mod contour;
pub mod document;
pub mod error;
pub mod mask;
pub mod quantize;
pub mod raster;
pub mod vectorizer;

pub use config::ConversionOptions;
pub use contour::{Contour, ContourSet, Point};
pub use document::{VectorDocument, VectorRegion, resolve_output_path};
pub use error::{Stage, VectraError, VectraResult};
pub use mask::{BinaryMask, ColorMask, MaskSet};
pub use quantize::{ColorCluster, Palette};
pub use raster::{PixelSpace, RasterImage};
pub use vectorizer::MaskVectorizer;
pub use vectorizer::polygon::{PolygonOptions, PolygonVectorizer, trace_to_polygons};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use crate::document::{next_free_index, output_candidate};
use crate::mask::build_masks;
use crate::quantize::quantize;
use crate::raster::load_raster;

/// Entry point for configuring and running raster-to-vector conversions.
#[derive(Debug, Clone)]
pub struct Vectra {
    options: ConversionOptions,
    /// Whether an explicit output path may replace an existing file.
    overwrite: bool,
}

impl Vectra {
    /// Validate `options` and build a converter.
    pub fn new(options: ConversionOptions) -> VectraResult<Self> {
        options.validate()?;
        Ok(Self {
            options,
            overwrite: true,
        })
    }

    /// Allow or refuse replacing an existing file at an explicit output path.
    /// Generated output paths never replace existing files.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Decode and normalize the image at `path`.
    pub fn for_image(&self, path: impl AsRef<Path>) -> VectraResult<LoadedImage> {
        let path = path.as_ref();
        let raster = load_raster(path)?;
        info!(
            path = %path.display(),
            width = raster.width(),
            height = raster.height(),
            space = ?raster.space(),
            "loaded image"
        );
        Ok(self.for_raster(raster))
    }

    /// Start a run from an already normalized image.
    pub fn for_raster(&self, raster: RasterImage) -> LoadedImage {
        LoadedImage {
            image: Arc::new(raster),
            options: self.options.clone(),
        }
    }

    /// Convert `input` and return the path of the written SVG.
    ///
    /// Without `output` the document is written to the first free
    /// `<stem>_converted[_n].svg` next to the input.
    pub fn convert(
        &self,
        input: impl AsRef<Path>,
        output: Option<&Path>,
    ) -> VectraResult<PathBuf> {
        self.convert_with_report(input, output)
            .map(|report| report.output_path)
    }

    /// Convert `input` and return what each stage produced and dropped.
    pub fn convert_with_report(
        &self,
        input: impl AsRef<Path>,
        output: Option<&Path>,
    ) -> VectraResult<ConversionReport> {
        let input = input.as_ref();
        let o = &self.options;
        info!(
            input = %input.display(),
            n_colors = o.n_colors,
            tolerance = o.tolerance,
            opacity = o.opacity,
            simplify_tolerance = o.simplify_tolerance,
            "starting conversion"
        );

        let loaded = self.for_image(input)?;
        let (width, height) = (loaded.image.width(), loaded.image.height());
        let pixel_space = loaded.image.space();
        let masked = loaded.quantize()?.masks()?;
        let (document, traced) = masked.trace_counted()?;
        let output_path = self.save(&document, input, output)?;
        info!(path = %output_path.display(), regions = document.len(), "wrote SVG");

        Ok(ConversionReport {
            output_path,
            width,
            height,
            pixel_space,
            requested_colors: self.options.n_colors,
            effective_colors: masked.palette.len(),
            masks_kept: masked.masks.masks.len(),
            masks_dropped: masked.masks.dropped,
            contours_traced: traced.traced,
            contours_dropped: traced.dropped,
            regions: document.len(),
        })
    }

    /// Run one conversion on a worker thread.
    pub fn spawn(
        self,
        input: PathBuf,
        output: Option<PathBuf>,
    ) -> JoinHandle<VectraResult<PathBuf>> {
        thread::spawn(move || self.convert(&input, output.as_deref()))
    }

    fn save(
        &self,
        document: &VectorDocument,
        input: &Path,
        output: Option<&Path>,
    ) -> VectraResult<PathBuf> {
        match output {
            Some(path) if self.overwrite => {
                document.write_to(path)?;
                Ok(path.to_path_buf())
            }
            Some(path) => {
                document.write_new(path)?;
                Ok(path.to_path_buf())
            }
            None => {
                let mut index = next_free_index(input, 0);
                loop {
                    let path = output_candidate(input, index);
                    match document.write_new(&path) {
                        Ok(()) => return Ok(path),
                        Err(VectraError::OutputExists { .. }) => {
                            debug!(path = %path.display(), "output path taken, trying the next one");
                            index = next_free_index(input, index + 1);
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }
}

/// Convert one image with `options`, returning the written SVG path.
pub fn convert_image_to_vector(
    image_path: impl AsRef<Path>,
    output_path: Option<&Path>,
    options: &ConversionOptions,
) -> VectraResult<PathBuf> {
    Vectra::new(options.clone())?.convert(image_path, output_path)
}

/// Counts gathered during one conversion run.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub output_path: PathBuf,
    pub width: usize,
    pub height: usize,
    pub pixel_space: PixelSpace,
    pub requested_colors: usize,
    pub effective_colors: usize,
    pub masks_kept: usize,
    pub masks_dropped: usize,
    pub contours_traced: usize,
    pub contours_dropped: usize,
    pub regions: usize,
}

/// A normalized image waiting to be quantized.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    image: Arc<RasterImage>,
    options: ConversionOptions,
}

impl LoadedImage {
    pub fn raster(&self) -> &RasterImage {
        &self.image
    }

    /// Cluster the image colors. When `blur_sigma` is set, clustering runs on a
    /// smoothed copy while masks are still built from the unsmoothed image.
    pub fn quantize(self) -> VectraResult<QuantizedImage> {
        let palette = match self.options.blur_sigma {
            Some(sigma) => quantize(&self.image.blurred(sigma), &self.options)?,
            None => quantize(&self.image, &self.options)?,
        };
        info!(clusters = palette.len(), "quantized colors");
        Ok(QuantizedImage {
            image: self.image,
            palette,
            options: self.options,
        })
    }
}

/// An image with its dominant colors.
#[derive(Debug, Clone)]
pub struct QuantizedImage {
    image: Arc<RasterImage>,
    palette: Palette,
    options: ConversionOptions,
}

impl QuantizedImage {
    pub fn raster(&self) -> &RasterImage {
        &self.image
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Build one mask per cluster, failing when every mask is empty.
    pub fn masks(self) -> VectraResult<MaskedImage> {
        let masks = build_masks(&self.image, &self.palette, self.options.tolerance)?;
        info!(
            kept = masks.masks.len(),
            dropped = masks.dropped,
            "built color masks"
        );
        if masks.masks.is_empty() {
            return Err(VectraError::NoRegionsFound {
                n_colors: self.options.n_colors,
                tolerance: self.options.tolerance,
            });
        }
        Ok(MaskedImage {
            image: self.image,
            palette: self.palette,
            masks,
            options: self.options,
        })
    }
}

/// Contour bookkeeping summed over every mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TraceCounts {
    traced: usize,
    dropped: usize,
}

/// Non-empty color masks ready to be traced.
#[derive(Debug, Clone)]
pub struct MaskedImage {
    image: Arc<RasterImage>,
    palette: Palette,
    masks: MaskSet,
    options: ConversionOptions,
}

impl MaskedImage {
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn masks(&self) -> &[ColorMask] {
        &self.masks.masks
    }

    /// Number of clusters whose mask came out empty.
    pub fn dropped_masks(&self) -> usize {
        self.masks.dropped
    }

    /// Trace every mask with the given vectorizer, in mask order.
    pub fn trace_with<V>(
        &self,
        vectorizer: &V,
        options: &V::Options,
    ) -> VectraResult<Vec<V::Output>>
    where
        V: MaskVectorizer,
    {
        self.masks
            .masks
            .iter()
            .map(|m| vectorizer.vectorize(&m.mask, options))
            .collect()
    }

    /// Trace and simplify every mask into a vector document.
    pub fn trace(&self) -> VectraResult<VectorDocument> {
        self.trace_counted().map(|(document, _)| document)
    }

    fn trace_counted(&self) -> VectraResult<(VectorDocument, TraceCounts)> {
        let options = PolygonOptions {
            simplify_tolerance: self.options.simplify_tolerance,
        };
        let traced = self.trace_with(&PolygonVectorizer, &options)?;

        let (height, width) = self.image.dim();
        let mut document = VectorDocument::new(width, height);
        let mut counts = TraceCounts::default();
        for (color_mask, set) in self.masks.masks.iter().zip(traced) {
            debug!(
                cluster = color_mask.cluster,
                color = ?color_mask.color,
                traced = set.traced,
                kept = set.contours.len(),
                "traced mask"
            );
            counts.traced += set.traced;
            counts.dropped += set.dropped;
            for contour in set.contours {
                document.push(VectorRegion {
                    contour,
                    fill: color_mask.color,
                    opacity: self.options.opacity,
                });
            }
        }

        info!(paths = document.len(), "traced contours");
        if document.is_empty() {
            return Err(VectraError::NoRenderablePaths {
                masks: self.masks.masks.len(),
                contours: counts.traced,
                simplify_tolerance: self.options.simplify_tolerance,
            });
        }
        Ok((document, counts))
    }
}
