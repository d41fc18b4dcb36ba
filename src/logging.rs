//! Development-time tracing for debugging the mission loop.
//!
//! Tracing is dev diagnostics via `RUST_LOG`, output to stderr; it is not
//! part of the product output. Mission progress and model replies go to
//! stdout through the event callback, and execution records land in the
//! journal (`io/journal`), both unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset.
/// Output: stderr, compact format.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
