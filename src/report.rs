use vectra::{ConversionReport, Stage, VectraError};

pub fn report_error(err: &VectraError) {
    match err.stage() {
        Some(stage) => eprintln!("Error while {stage}: {err}"),
        None => eprintln!("Error: {err}"),
    }

    match err {
        VectraError::NoRegionsFound { .. } => {
            eprintln!();
            eprintln!("No pixel matched any dominant color. Try:");
            eprintln!("  - a larger --tolerance");
            eprintln!("  - fewer --colors, or a different --seed");
        }
        VectraError::NoRenderablePaths { .. } => {
            eprintln!();
            eprintln!("Every traced region collapsed during simplification.");
            eprintln!("Try a smaller --simplify value.");
        }
        VectraError::OutputExists { .. } => {
            eprintln!();
            eprintln!("Pass --force to overwrite it, or omit -o to pick a free name.");
        }
        VectraError::UnsupportedImageShape { .. } => {
            eprintln!();
            eprintln!("Convert the image to grayscale, RGB or RGBA first.");
        }
        _ if err.stage() == Some(Stage::Loading) => {
            eprintln!();
            eprintln!("Check that the file exists and is a PNG, JPEG or other common raster format.");
        }
        _ => {}
    }
}

/// One-line summary of a finished conversion.
pub fn summary(report: &ConversionReport) -> String {
    format!(
        "SVG saved to {} ({}x{}, {} of {} colors, {} regions, {} empty masks, {} contours dropped)",
        report.output_path.display(),
        report.width,
        report.height,
        report.masks_kept,
        report.requested_colors,
        report.regions,
        report.masks_dropped,
        report.contours_dropped,
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use vectra::PixelSpace;

    use super::*;

    #[test]
    fn summary_lists_counts() {
        let report = ConversionReport {
            output_path: PathBuf::from("out.svg"),
            width: 4,
            height: 3,
            pixel_space: PixelSpace::Rgb,
            requested_colors: 5,
            effective_colors: 2,
            masks_kept: 2,
            masks_dropped: 0,
            contours_traced: 3,
            contours_dropped: 1,
            regions: 2,
        };
        assert_eq!(
            summary(&report),
            "SVG saved to out.svg (4x3, 2 of 5 colors, 2 regions, 0 empty masks, 1 contours dropped)"
        );
    }
}
