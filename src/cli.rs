use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use vectra::ConversionOptions;
use vectra::config::{
    DEFAULT_MAX_ITERATIONS, DEFAULT_N_COLORS, DEFAULT_N_INIT, DEFAULT_OPACITY,
    DEFAULT_SIMPLIFY_TOLERANCE, DEFAULT_TOLERANCE,
};

/// Command line interface definition.
#[derive(Parser, Debug)]
#[command(author, version, about, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalOptions {
    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert raster images into SVG documents
    Convert(ConvertCommand),
    /// Print the dominant colors found in an image
    Palette(PaletteCommand),
    /// Export the per-color membership masks as PNGs
    Mask(MaskCommand),
}

#[derive(Args, Debug)]
pub struct ConvertCommand {
    /// Input image paths
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
    /// Output SVG path (defaults to `<name>_converted.svg`, single input only)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Overwrite an existing file at the explicit output path
    #[arg(long)]
    pub force: bool,
    #[command(flatten)]
    pub conversion: ConversionArgs,
}

#[derive(Args, Debug)]
pub struct PaletteCommand {
    /// Input image path
    pub input: PathBuf,
    #[command(flatten)]
    pub conversion: ConversionArgs,
}

#[derive(Args, Debug)]
pub struct MaskCommand {
    /// Input image path
    pub input: PathBuf,
    /// Directory for the mask PNGs (defaults to the input's directory)
    #[arg(short = 'd', long = "out-dir")]
    pub out_dir: Option<PathBuf>,
    #[command(flatten)]
    pub conversion: ConversionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ConversionArgs {
    /// Number of dominant colors to extract
    #[arg(short = 'c', long = "colors", env = "VECTRA_COLORS", default_value_t = DEFAULT_N_COLORS)]
    pub colors: usize,
    /// Half-width of the HSV matching window around each color (0.0-1.0)
    #[arg(short = 't', long, env = "VECTRA_TOLERANCE", default_value_t = DEFAULT_TOLERANCE)]
    pub tolerance: f64,
    /// Fill opacity of every region (0.0-1.0)
    #[arg(long, env = "VECTRA_OPACITY", default_value_t = DEFAULT_OPACITY)]
    pub opacity: f64,
    /// Maximum deviation in pixels when simplifying contours
    #[arg(short = 's', long = "simplify", env = "VECTRA_SIMPLIFY", default_value_t = DEFAULT_SIMPLIFY_TOLERANCE)]
    pub simplify: f64,
    /// Seed for color clustering
    #[arg(long, env = "VECTRA_SEED", default_value_t = 0)]
    pub seed: u64,
    /// Iteration cap for one clustering run
    #[arg(long = "max-iterations", env = "VECTRA_MAX_ITERATIONS", default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,
    /// Number of clustering restarts; the best one is kept
    #[arg(long = "restarts", env = "VECTRA_RESTARTS", default_value_t = DEFAULT_N_INIT)]
    pub restarts: usize,
    /// Gaussian sigma applied before clustering
    #[arg(long = "blur", value_name = "SIGMA", env = "VECTRA_BLUR")]
    pub blur: Option<f32>,
}

impl From<&ConversionArgs> for ConversionOptions {
    fn from(args: &ConversionArgs) -> Self {
        ConversionOptions::default()
            .with_n_colors(args.colors)
            .with_tolerance(args.tolerance)
            .with_opacity(args.opacity)
            .with_simplify_tolerance(args.simplify)
            .with_seed(args.seed)
            .with_max_iterations(args.max_iterations)
            .with_n_init(args.restarts)
            .with_blur_sigma(args.blur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn convert_defaults_match_library() {
        let cli = Cli::try_parse_from(["vectra", "convert", "in.png"]).unwrap();
        let Commands::Convert(cmd) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(cmd.inputs, vec![PathBuf::from("in.png")]);
        assert!(!cmd.force);
        let options: ConversionOptions = (&cmd.conversion).into();
        assert_eq!(options, ConversionOptions::default());
    }

    #[test]
    fn convert_flags_map_onto_options() {
        let cli = Cli::try_parse_from([
            "vectra", "-vv", "convert", "a.png", "-o", "a.svg", "--colors", "3", "--tolerance",
            "0.1", "--opacity", "0.5", "--simplify", "2", "--seed", "7", "--restarts", "2",
            "--blur", "1.5", "--force",
        ])
        .unwrap();
        assert_eq!(cli.global.verbose, 2);
        let Commands::Convert(cmd) = cli.command else {
            panic!("expected convert");
        };
        assert!(cmd.force);
        assert_eq!(cmd.output, Some(PathBuf::from("a.svg")));
        let options: ConversionOptions = (&cmd.conversion).into();
        assert_eq!(options.n_colors, 3);
        assert_eq!(options.tolerance, 0.1);
        assert_eq!(options.opacity, 0.5);
        assert_eq!(options.simplify_tolerance, 2.0);
        assert_eq!(options.seed, 7);
        assert_eq!(options.n_init, 2);
        assert_eq!(options.blur_sigma, Some(1.5));
    }

    #[test]
    fn convert_requires_input() {
        assert!(Cli::try_parse_from(["vectra", "convert"]).is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["vectra", "-q", "-v", "palette", "a.png"]).is_err());
    }
}
