mod convert;
mod mask;
mod palette;
mod utils;

use crate::cli::{Cli, Commands};
use vectra::VectraResult;

/// The main function to run the command based on CLI input.
pub fn run(cli: Cli) -> VectraResult<()> {
    dispatch(cli.command)
}

/// Dispatch the command to the appropriate handler.
fn dispatch(command: Commands) -> VectraResult<()> {
    match command {
        Commands::Convert(cmd) => convert::run(cmd),
        Commands::Palette(cmd) => palette::run(cmd),
        Commands::Mask(cmd) => mask::run(cmd),
    }
}
