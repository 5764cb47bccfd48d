//! Diagnostic logging setup.
//!
//! Logs go to stderr through `tracing`. The filter comes from the
//! `ASSETPIPE_LOG` environment variable when set (same syntax as `RUST_LOG`),
//! otherwise `warn`, or `assetpipe=debug` with `--verbose`.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "ASSETPIPE_LOG";

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Default filter directive for the given verbosity.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "warn,assetpipe=debug"
    } else {
        "warn"
    }
}

/// Build the filter from the environment, falling back to the default.
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(verbose: bool) {
    if LOGGER_INITIALIZED.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
        return;
    }

    let console = tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false);
    let _ = tracing_subscriber::registry().with(console).with(env_filter(verbose)).try_init();
}
