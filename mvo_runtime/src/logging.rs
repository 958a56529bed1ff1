//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

pub const LOG_ENV: &str = "MVO_LOG";
pub const DEFAULT_FILTER: &str = "mvo_engine=info,mvo_runtime=info";

/// Install the global subscriber.
///
/// Reads per-target levels from `MVO_LOG`, e.g.
/// `MVO_LOG=mvo_engine::selector=debug,mvo_runtime=warn`, and falls back to
/// `DEFAULT_FILTER` when unset or invalid. Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    install(filter);
}

/// Like `init_tracing`, with an explicit filter directive.
pub fn init_tracing_with_filter(directives: &str) {
    install(EnvFilter::new(directives));
}

fn install(filter: EnvFilter) {
    INIT.call_once(|| {
        // Output goes to stderr so stdout stays clean for results.
        let registered = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .with(filter)
            .try_init();
        if registered.is_err() {
            tracing::debug!("global subscriber already set, keeping it");
        }
    });
}
