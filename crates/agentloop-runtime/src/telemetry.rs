//! Tracing setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, RuntimeError};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Fails if a subscriber is already
/// installed.
pub fn init_tracing(default_filter: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| RuntimeError::Telemetry(e.to_string()))
}
