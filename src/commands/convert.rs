use vectra::{VectraError, VectraResult};

use crate::cli::ConvertCommand;
use crate::report::summary;

use super::utils::build_vectra;

/// The main function to run the convert command.
pub fn run(cmd: ConvertCommand) -> VectraResult<()> {
    if cmd.output.is_some() && cmd.inputs.len() > 1 {
        return Err(VectraError::InvalidOption {
            name: "output",
            reason: format!(
                "an explicit output path needs exactly one input, got {}",
                cmd.inputs.len()
            ),
        });
    }

    let vectra = build_vectra(&cmd.conversion)?.with_overwrite(cmd.force);
    for input in &cmd.inputs {
        let report = vectra.convert_with_report(input, cmd.output.as_deref())?;
        println!("{}", summary(&report));
    }
    Ok(())
}
