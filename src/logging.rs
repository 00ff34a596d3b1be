//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber, logging to stderr.
///
/// `RUST_LOG` wins when set; otherwise each `-v` raises the default level
/// from `warn` through `info` and `debug` to `trace`.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Ignore failure: a subscriber may already be installed (tests).
    _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(true).try_init();
}
