//! Internal tracing output, controlled by `COMPDB_LOG`.

use std::error::Error;

use tracing_subscriber::EnvFilter;

use crate::GlobalArgs;

/// Environment variable holding an `EnvFilter` directive, e.g. `compdb_cache=debug`.
const LOG_ENV: &str = "COMPDB_LOG";

/// Installs a stderr subscriber, reporting on stderr if that fails.
pub fn init_logging(global: &GlobalArgs) {
    if let Err(e) = try_init_logging(global) {
        eprintln!("warning: could not initialize logging: {e}");
    }
}

/// Installs a stderr subscriber.
///
/// `COMPDB_LOG` wins when set; otherwise `--verbose` and `--quiet` pick
/// the level, defaulting to `warn`.
fn try_init_logging(global: &GlobalArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let level = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(global.color)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
}
