//! Diagnostic logging setup.
//!
//! `tracing` events go to stderr so they never mix with command output.
//! The filter comes from `$APPFLEET_LOG` (same syntax as `RUST_LOG`);
//! `--verbose` overrides it with `debug`.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "APPFLEET_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Build the filter for this invocation.
#[must_use]
pub fn filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(verbose: bool, no_color: bool) {
    let _ = tracing_subscriber::registry()
        .with(filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!no_color && std::env::var_os("NO_COLOR").is_none())
                .with_target(false),
        )
        .try_init();
}
