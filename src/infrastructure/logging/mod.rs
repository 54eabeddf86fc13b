//! Logging setup: stdout plus an optional plain-text log file

use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::application::errors::ConfigError;
use crate::infrastructure::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ConfigError::InvalidValue(format!("logging.level {}: {}", config.level, e)))?;

    let file_layer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ConfigError::InvalidValue(format!("logging.file {}: {}", path.display(), e)))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()
        .map_err(|e| ConfigError::InvalidValue(format!("logging already initialised: {}", e)))
}
