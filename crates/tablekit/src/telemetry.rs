//! Tracing subscriber setup for binaries and integration harnesses that embed the library.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a formatted subscriber filtered by `RUST_LOG`, falling back to `default_filter`.
///
/// Returns an error when a global subscriber is already installed.
pub fn init(default_filter: &str) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}
