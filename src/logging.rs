use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::cli::GlobalOptions;

/// Log level picked from `-q` / `-v` flags.
fn level_for(global: &GlobalOptions) -> Level {
    match (global.quiet, global.verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        (false, _) => Level::TRACE,
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins when no flag is given.
pub fn init(global: &GlobalOptions) {
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr);

    let explicit = global.quiet || global.verbose > 0;
    match EnvFilter::try_from_default_env() {
        Ok(filter) if !explicit => builder.with_env_filter(filter).init(),
        _ => builder.with_max_level(level_for(global)).init(),
    }
}
