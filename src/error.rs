use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::raster::PixelSpace;

/// Result type alias for operations that may fail with [`VectraError`].
pub type VectraResult<T> = std::result::Result<T, VectraError>;

/// Pipeline stage in which an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loading,
    Quantizing,
    Masking,
    Contouring,
    Emitting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Loading => "loading",
            Stage::Quantizing => "quantizing",
            Stage::Masking => "masking",
            Stage::Contouring => "contouring",
            Stage::Emitting => "emitting",
        };
        f.write_str(name)
    }
}

/// Error types that can occur during a conversion run.
///
/// Input errors are raised before or while loading, degenerate-result errors
/// when a stage produces nothing usable, and resource errors when the output
/// cannot be written.
#[derive(Debug, Error)]
pub enum VectraError {
    /// The source file is missing, unreadable, or not a supported raster format.
    #[error("Failed to read image {}: {source}", path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// The decoded image has a channel count other than 1, 3 or 4.
    #[error("Unsupported image shape: {channels} channel(s), expected 1, 3 or 4")]
    UnsupportedImageShape { channels: u8 },
    /// A conversion option is outside its documented range.
    #[error("Invalid option `{name}`: {reason}")]
    InvalidOption { name: &'static str, reason: String },
    /// Quantization found no colors at all.
    #[error("Image contains no distinct colors")]
    EmptyImage,
    /// Every color mask came out empty.
    #[error(
        "No color regions found with n_colors={n_colors} and tolerance={tolerance}; try increasing tolerance"
    )]
    NoRegionsFound { n_colors: usize, tolerance: f64 },
    /// Masks exist, but every traced contour was discarded by simplification.
    #[error(
        "No renderable paths: {contours} contour(s) from {masks} mask(s) collapsed with simplify_tolerance={simplify_tolerance}; try lowering simplify_tolerance"
    )]
    NoRenderablePaths {
        masks: usize,
        contours: usize,
        simplify_tolerance: f64,
    },
    /// A palette was applied to an image of a different pixel space.
    #[error("Palette pixel space {palette:?} does not match image pixel space {image:?}")]
    PixelSpaceMismatch {
        image: PixelSpace,
        palette: PixelSpace,
    },
    /// The explicit output path exists and overwriting was not allowed.
    #[error("Output file already exists: {}", path.display())]
    OutputExists { path: PathBuf },
    /// Image encoding error while exporting masks.
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),
    /// File system I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Markup serialization failed.
    #[error("SVG serialization failed: {0}")]
    Xml(String),
}

impl VectraError {
    /// The pipeline stage that raised this error, when it belongs to one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            VectraError::ImageRead { .. } | VectraError::UnsupportedImageShape { .. } => {
                Some(Stage::Loading)
            }
            VectraError::EmptyImage => Some(Stage::Quantizing),
            VectraError::NoRegionsFound { .. } | VectraError::PixelSpaceMismatch { .. } => {
                Some(Stage::Masking)
            }
            VectraError::NoRenderablePaths { .. } => Some(Stage::Contouring),
            VectraError::OutputExists { .. } | VectraError::Xml(_) | VectraError::Io(_) => {
                Some(Stage::Emitting)
            }
            VectraError::InvalidOption { .. } | VectraError::Image(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_errors_map_to_their_stage() {
        assert_eq!(VectraError::EmptyImage.stage(), Some(Stage::Quantizing));
        let err = VectraError::NoRegionsFound {
            n_colors: 3,
            tolerance: 0.0,
        };
        assert_eq!(err.stage(), Some(Stage::Masking));
        let err = VectraError::NoRenderablePaths {
            masks: 1,
            contours: 2,
            simplify_tolerance: 9.0,
        };
        assert_eq!(err.stage(), Some(Stage::Contouring));
    }

    #[test]
    fn messages_carry_parameters() {
        let err = VectraError::NoRegionsFound {
            n_colors: 4,
            tolerance: 0.05,
        };
        let message = err.to_string();
        assert!(message.contains("n_colors=4"));
        assert!(message.contains("tolerance=0.05"));

        let err = VectraError::NoRenderablePaths {
            masks: 2,
            contours: 7,
            simplify_tolerance: 3.5,
        };
        assert!(err.to_string().contains("simplify_tolerance=3.5"));
    }

    #[test]
    fn invalid_option_has_no_stage() {
        let err = VectraError::InvalidOption {
            name: "opacity",
            reason: "must lie in [0, 1]".into(),
        };
        assert_eq!(err.stage(), None);
        assert_eq!(err.to_string(), "Invalid option `opacity`: must lie in [0, 1]");
    }
}
