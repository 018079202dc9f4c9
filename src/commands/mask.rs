use vectra::VectraResult;
use vectra::color::rgb_to_hex;

use crate::cli::MaskCommand;

use super::utils::{build_vectra, derive_variant_path};

/// The main function to run the mask command.
pub fn run(cmd: MaskCommand) -> VectraResult<()> {
    let vectra = build_vectra(&cmd.conversion)?;
    let masked = vectra.for_image(&cmd.input)?.quantize()?.masks()?;

    for color_mask in masked.masks() {
        let suffix = format!("mask_{}", color_mask.cluster);
        let path = derive_variant_path(&cmd.input, cmd.out_dir.as_deref(), &suffix, "png");
        color_mask.mask.to_gray_image().save(&path)?;
        println!(
            "Mask for {} ({} px) saved to {}",
            rgb_to_hex(color_mask.color),
            color_mask.mask.count(),
            path.display()
        );
    }
    if masked.dropped_masks() > 0 {
        println!("{} color(s) matched no pixel", masked.dropped_masks());
    }
    Ok(())
}
