use vectra::VectraResult;
use vectra::color::rgb_to_hex;
use vectra::quantize::Palette;

use crate::cli::PaletteCommand;

use super::utils::build_vectra;

/// The main function to run the palette command.
pub fn run(cmd: PaletteCommand) -> VectraResult<()> {
    let vectra = build_vectra(&cmd.conversion)?;
    let quantized = vectra.for_image(&cmd.input)?.quantize()?;
    for line in palette_lines(quantized.palette()) {
        println!("{line}");
    }
    Ok(())
}

/// One `#rrggbb  <pixels> px  <share>%` line per cluster.
fn palette_lines(palette: &Palette) -> Vec<String> {
    let total: usize = palette.populations().iter().sum();
    palette
        .display_colors()
        .into_iter()
        .zip(palette.populations())
        .map(|(color, population)| {
            let share = if total > 0 {
                100.0 * population as f64 / total as f64
            } else {
                0.0
            };
            format!("{}  {population:>8} px  {share:5.1}%", rgb_to_hex(color))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::utils::test_conversion_args;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;
    use vectra::VectraError;

    #[test]
    fn lines_list_colors_by_population() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("stripes.png");
        RgbImage::from_fn(4, 1, |x, _| if x == 0 { Rgb([0, 0, 255]) } else { Rgb([255, 0, 0]) })
            .save(&input)
            .unwrap();

        let vectra = build_vectra(&test_conversion_args(2)).unwrap();
        let quantized = vectra.for_image(&input).unwrap().quantize().unwrap();
        assert_eq!(
            palette_lines(quantized.palette()),
            [
                "#ff0000         3 px   75.0%",
                "#0000ff         1 px   25.0%"
            ]
        );
    }

    #[test]
    fn run_reports_missing_input() {
        let dir = tempdir().unwrap();
        let cmd = PaletteCommand {
            input: dir.path().join("missing.png"),
            conversion: test_conversion_args(2),
        };
        assert!(matches!(run(cmd), Err(VectraError::ImageRead { .. })));
    }
}
