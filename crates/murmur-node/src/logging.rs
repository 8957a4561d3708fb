//! Log filter setup.

use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LOG_DIRECTIVES: &str = "murmur_node=info,murmur_gossip=info";

/// Builds the log filter from the value of `RUST_LOG`.
///
/// A set value replaces the defaults entirely.
#[must_use]
pub fn env_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVES))
}
