//! Tracing setup for the `sakila-etl` binary.
//!
//! The level comes from `RUST_LOG` (default `info`); `--json` switches the
//! console output to one JSON object per line.

use std::sync::OnceLock;

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

const DEFAULT_FILTER: &str = "info";

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber once; later calls are no-ops.
pub fn init_logging(json: bool) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let layer: Box<dyn Layer<Registry> + Send + Sync> = if json {
            fmt::layer()
                .with_target(true)
                .json()
                .with_current_span(true)
                .with_filter(env_filter())
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(env_filter())
                .boxed()
        };

        // Don't panic if a subscriber already exists (tests).
        let _ = tracing_subscriber::registry().with(layer).try_init();
    });
}
