//! Logging setup for the daemon.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Build the log filter: `RUST_LOG` when set and valid, otherwise `level`.
///
/// An unparsable `level` falls back to `info`.
pub fn env_filter(level: &str) -> EnvFilter {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_from(directives.as_deref(), level)
}

fn filter_from(directives: Option<&str>, level: &str) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Install the global subscriber, printing to stderr.
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(level: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(stderr_layer)
        .try_init()
}
