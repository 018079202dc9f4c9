use crate::{VectraError, VectraResult};

/// Default number of dominant colors extracted from the image.
pub const DEFAULT_N_COLORS: usize = 5;
/// Default half-width of the HSV / intensity matching window.
pub const DEFAULT_TOLERANCE: f64 = 0.2;
/// Default fill opacity applied to every region.
pub const DEFAULT_OPACITY: f64 = 1.0;
/// Default maximum deviation allowed when dropping contour vertices.
pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 0.5;
/// Default iteration cap for one k-means run.
pub const DEFAULT_MAX_ITERATIONS: usize = 300;
/// Default number of k-means restarts.
pub const DEFAULT_N_INIT: usize = 10;

/// Options for a single conversion run.
///
/// Built once per run and passed by reference through every stage; nothing is
/// read from ambient state.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOptions {
    /// Target number of color clusters (at least 1).
    pub n_colors: usize,
    /// Half-width of the matching window around each cluster center, in [0, 1].
    pub tolerance: f64,
    /// Fill opacity written for every region, in [0, 1].
    pub opacity: f64,
    /// Douglas-Peucker distance threshold in pixels (at least 0).
    pub simplify_tolerance: f64,
    /// Seed for the k-means initialization.
    pub seed: u64,
    /// Iteration cap for a single k-means run.
    pub max_iterations: usize,
    /// Number of independently seeded k-means runs; the lowest inertia wins.
    pub n_init: usize,
    /// Gaussian sigma applied before quantization, if any.
    pub blur_sigma: Option<f32>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            n_colors: DEFAULT_N_COLORS,
            tolerance: DEFAULT_TOLERANCE,
            opacity: DEFAULT_OPACITY,
            simplify_tolerance: DEFAULT_SIMPLIFY_TOLERANCE,
            seed: 0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            n_init: DEFAULT_N_INIT,
            blur_sigma: None,
        }
    }
}

impl ConversionOptions {
    /// Set the target number of color clusters.
    pub fn with_n_colors(mut self, n_colors: usize) -> Self {
        self.n_colors = n_colors;
        self
    }

    /// Set the color matching tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the fill opacity.
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    /// Set the contour simplification tolerance.
    pub fn with_simplify_tolerance(mut self, simplify_tolerance: f64) -> Self {
        self.simplify_tolerance = simplify_tolerance;
        self
    }

    /// Set the k-means seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the k-means iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the number of k-means restarts.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Enable or disable gaussian smoothing before quantization.
    pub fn with_blur_sigma(mut self, blur_sigma: Option<f32>) -> Self {
        self.blur_sigma = blur_sigma;
        self
    }

    /// Check every option against its documented range.
    pub fn validate(&self) -> VectraResult<()> {
        if self.n_colors == 0 {
            return Err(invalid("n_colors", "must be at least 1"));
        }
        check_unit_interval("tolerance", self.tolerance)?;
        check_unit_interval("opacity", self.opacity)?;
        if !self.simplify_tolerance.is_finite() || self.simplify_tolerance < 0.0 {
            return Err(invalid(
                "simplify_tolerance",
                format!(
                    "must be a finite value >= 0, got {}",
                    self.simplify_tolerance
                ),
            ));
        }
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations", "must be at least 1"));
        }
        if self.n_init == 0 {
            return Err(invalid("n_init", "must be at least 1"));
        }
        if let Some(sigma) = self.blur_sigma
            && (!sigma.is_finite() || sigma <= 0.0)
        {
            return Err(invalid(
                "blur_sigma",
                format!("must be a finite value > 0, got {sigma}"),
            ));
        }
        Ok(())
    }
}

fn check_unit_interval(name: &'static str, value: f64) -> VectraResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(name, format!("must lie in [0, 1], got {value}")))
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> VectraError {
    VectraError::InvalidOption {
        name,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected_name(options: &ConversionOptions) -> &'static str {
        match options.validate() {
            Err(VectraError::InvalidOption { name, .. }) => name,
            other => panic!("expected InvalidOption, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let options = ConversionOptions::default();
        assert_eq!(options.n_colors, 5);
        assert_eq!(options.tolerance, 0.2);
        assert_eq!(options.opacity, 1.0);
        assert_eq!(options.simplify_tolerance, 0.5);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn builder_sets_fields() {
        let options = ConversionOptions::default()
            .with_n_colors(2)
            .with_tolerance(0.05)
            .with_opacity(0.8)
            .with_simplify_tolerance(0.1)
            .with_seed(42)
            .with_blur_sigma(Some(1.5));
        assert_eq!(options.n_colors, 2);
        assert_eq!(options.tolerance, 0.05);
        assert_eq!(options.opacity, 0.8);
        assert_eq!(options.simplify_tolerance, 0.1);
        assert_eq!(options.seed, 42);
        assert_eq!(options.blur_sigma, Some(1.5));
    }

    #[test]
    fn zero_colors_rejected() {
        let options = ConversionOptions::default().with_n_colors(0);
        assert_eq!(rejected_name(&options), "n_colors");
    }

    #[test]
    fn tolerance_out_of_range_rejected() {
        assert_eq!(
            rejected_name(&ConversionOptions::default().with_tolerance(1.5)),
            "tolerance"
        );
        assert_eq!(
            rejected_name(&ConversionOptions::default().with_tolerance(-0.1)),
            "tolerance"
        );
        assert_eq!(
            rejected_name(&ConversionOptions::default().with_tolerance(f64::NAN)),
            "tolerance"
        );
    }

    #[test]
    fn opacity_out_of_range_rejected() {
        assert_eq!(
            rejected_name(&ConversionOptions::default().with_opacity(1.01)),
            "opacity"
        );
    }

    #[test]
    fn negative_simplify_tolerance_rejected() {
        assert_eq!(
            rejected_name(&ConversionOptions::default().with_simplify_tolerance(-1.0)),
            "simplify_tolerance"
        );
        assert_eq!(
            rejected_name(&ConversionOptions::default().with_simplify_tolerance(f64::INFINITY)),
            "simplify_tolerance"
        );
    }

    #[test]
    fn boundary_values_accepted() {
        let options = ConversionOptions::default()
            .with_tolerance(0.0)
            .with_opacity(0.0)
            .with_simplify_tolerance(0.0);
        assert!(options.validate().is_ok());
        let options = ConversionOptions::default()
            .with_tolerance(1.0)
            .with_opacity(1.0);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn bad_blur_sigma_rejected() {
        assert_eq!(
            rejected_name(&ConversionOptions::default().with_blur_sigma(Some(0.0))),
            "blur_sigma"
        );
        assert_eq!(
            rejected_name(&ConversionOptions::default().with_blur_sigma(Some(f32::NAN))),
            "blur_sigma"
        );
    }

    #[test]
    fn zero_iterations_or_restarts_rejected() {
        assert_eq!(
            rejected_name(&ConversionOptions::default().with_max_iterations(0)),
            "max_iterations"
        );
        assert_eq!(
            rejected_name(&ConversionOptions::default().with_n_init(0)),
            "n_init"
        );
    }
}
