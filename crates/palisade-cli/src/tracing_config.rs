//! Initializes the global `tracing` subscriber used by every pass
//! (`tracing::debug_span!("bind")`, `tracing::debug_span!("check")`, ...).
//!
//! Verbosity is controlled by repeating `-v` on the command line, or by
//! `RUST_LOG` when set (which always takes precedence, matching the usual
//! `tracing-subscriber` convention).

use tracing_subscriber::EnvFilter;

pub fn init(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
