//! `tracing-subscriber` initialization: `-v`/`--verbose` plus `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Builds a filter from the `-v` count (0 = warn, 1 = info, 2 = debug, 3+ =
/// trace) and layers `RUST_LOG` on top when set, matching the convention
/// `tracing_subscriber::EnvFilter` already understands.
pub fn init(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
