//! Logging initialization.
//!
//! Library code only emits `tracing` events; the binary installs the
//! subscriber. Logs go to stderr so stdout stays clean for `--json` output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter for the CLI flags. `quiet` wins over `verbose`.
pub fn default_level(quiet: bool, verbose: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Installs the global subscriber; `RUST_LOG` overrides the flag-derived level.
/// A second call is a no-op.
pub fn init(quiet: bool, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(quiet, verbose)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
