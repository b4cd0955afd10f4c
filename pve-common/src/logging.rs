//! Logging initialization using tracing.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the tracing subscriber with the specified log level.
///
/// # Arguments
/// * `level` - Log level string (trace, debug, info, warn, error)
///
/// Panics if a global subscriber is already installed; use
/// [`try_init_logging`] where that can happen (tests, embedding hosts).
pub fn init_logging(level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(filter(level))
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    Ok(())
}

/// Initialize logging with JSON output format.
/// Suitable for hosts that ship provider logs to an aggregator.
pub fn init_logging_json(level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(filter(level))
        .with(fmt::layer().json().with_target(true).with_thread_ids(true))
        .init();

    Ok(())
}

/// Like [`init_logging`], but returns an error instead of panicking when a
/// subscriber has already been set.
pub fn try_init_logging(level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(filter(level))
        .with(fmt::layer().with_target(true).with_test_writer())
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_init_is_idempotent() {
        // The first call may or may not win depending on test ordering,
        // but a second call must report the existing subscriber.
        let _ = try_init_logging("debug");
        assert!(try_init_logging("debug").is_err());
    }
}
