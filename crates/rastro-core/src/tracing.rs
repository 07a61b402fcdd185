use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Level used when `RUST_LOG` is absent or unparseable. Dispatch suppressions
/// and purge counts log at info, so that is the floor operators expect.
const DEFAULT_DIRECTIVE: &str = "info";

/// Install the JSON stdout subscriber. Call once at service startup.
///
/// The filter comes from `RUST_LOG`, falling back to [`DEFAULT_DIRECTIVE`] so
/// a bare container still emits the dispatch/purge lines dashboards scrape.
/// Calling this again after a subscriber is installed is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json())
        .try_init();
}
