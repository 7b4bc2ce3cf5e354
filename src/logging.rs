//! # Structured Logging
//!
//! Environment-aware tracing initialization for hosts that have no
//! subscriber of their own.

use crate::config::LoaderSettings;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize console logging once per process. Respects `FORGE_LOG` for
/// filtering, defaulting to `debug` outside production. Safe to call when a
/// global subscriber is already installed.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let settings = LoaderSettings::load().unwrap_or_default();
        let default_level = if settings.is_production() {
            "info"
        } else {
            "debug"
        };
        let filter =
            EnvFilter::try_from_env("FORGE_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_filter(filter),
        );

        // A host (or another test) may have installed a subscriber already.
        if subscriber.try_init().is_err() {
            tracing::debug!("global tracing subscriber already initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_logging();
        init_logging();
    }
}
