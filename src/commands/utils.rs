use std::path::{Path, PathBuf};

use vectra::{ConversionOptions, Vectra, VectraResult};

use crate::cli::ConversionArgs;

/// The convenience function to build a validated Vectra instance from the conversion arguments.
pub fn build_vectra(args: &ConversionArgs) -> VectraResult<Vectra> {
    let options: ConversionOptions = args.into();
    Vectra::new(options)
}

/// Derive a variant file path by appending a suffix before the extension.
pub fn derive_variant_path(input: &Path, dir: Option<&Path>, suffix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| suffix.to_string());
    let filename = format!("{stem}_{suffix}.{extension}");
    match dir {
        Some(dir) => dir.join(filename),
        None => input.with_file_name(filename),
    }
}

#[cfg(test)]
pub fn test_conversion_args(colors: usize) -> ConversionArgs {
    use vectra::config::{
        DEFAULT_MAX_ITERATIONS, DEFAULT_N_INIT, DEFAULT_OPACITY, DEFAULT_SIMPLIFY_TOLERANCE,
        DEFAULT_TOLERANCE,
    };

    ConversionArgs {
        colors,
        tolerance: DEFAULT_TOLERANCE,
        opacity: DEFAULT_OPACITY,
        simplify: DEFAULT_SIMPLIFY_TOLERANCE,
        seed: 0,
        max_iterations: DEFAULT_MAX_ITERATIONS,
        restarts: DEFAULT_N_INIT,
        blur: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_sits_next_to_input() {
        assert_eq!(
            derive_variant_path(Path::new("shots/cat.png"), None, "mask_0", "png"),
            PathBuf::from("shots/cat_mask_0.png")
        );
    }

    #[test]
    fn variant_respects_directory_override() {
        assert_eq!(
            derive_variant_path(Path::new("shots/cat.png"), Some(Path::new("out")), "mask_1", "png"),
            PathBuf::from("out/cat_mask_1.png")
        );
    }
}
