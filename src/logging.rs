//! Logging setup for the CLI.
//!
//! Logs go to stderr so they never mix with the report on stdout. The level
//! is chosen in this order: `--verbose` (debug), `--quiet` (errors only),
//! `RUST_LOG`, then info.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// Calling it again after a subscriber is installed has no effect.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new("docsync=debug")
    } else if quiet {
        EnvFilter::new("docsync=error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docsync=info"))
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
