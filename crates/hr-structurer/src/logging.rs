//! Tracing subscriber setup, installed once at process start

use std::fs::OpenOptions;
use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Filter used when `RUST_LOG` is unset
fn default_filter(level: &str) -> String {
    format!("hr_structurer={level},tower_http={level},warn", level = level)
}

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over the configured level. When a log file is
/// configured, events go to it as well as to stdout.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(&config.level)))
        .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", config.level, e)))?;

    let stdout = if config.json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };

    let file = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    Error::Config(format!("Failed to open log file {}: {}", path.display(), e))
                })?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file))
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(file)
        .try_init()
        .map_err(|e| Error::internal(format!("Failed to install tracing subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter("debug"), "hr_structurer=debug,tower_http=debug,warn");
        assert!(EnvFilter::try_new(default_filter("info")).is_ok());
    }
}
