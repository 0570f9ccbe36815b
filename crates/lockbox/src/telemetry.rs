//! Logging initialization.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global `tracing` subscriber.
///
/// `log_level` is an `EnvFilter` directive such as `info` or
/// `depot=debug,warden=info`; `lockconf` already folds `RUST_LOG` into it.
/// Fails if the directive does not parse or a subscriber is already set.
pub fn init(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_new(log_level)
        .with_context(|| format!("Invalid log filter {log_level:?}"))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .context("Global tracing subscriber already installed")?;

    tracing::debug!(filter = %log_level, "telemetry initialized");
    Ok(())
}
