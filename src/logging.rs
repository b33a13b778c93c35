//! Structured logging setup
//!
//! Provides JSON-formatted and human-readable logging with optional file
//! output. Console logs go to STDERR so command output on STDOUT stays
//! machine-readable.

use crate::config::LoggingConfig;
use anyhow::Result;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Builds the level filter: `RUST_LOG` wins over the configured level.
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?)
}

/// Initialize logging based on configuration.
///
/// # Errors
///
/// Returns an error if the level is not a valid filter directive, the log
/// file cannot be opened, or a global subscriber is already installed.
///
/// # Examples
///
/// ```no_run
/// use queuechat::config::LoggingConfig;
/// use queuechat::logging::init_logging;
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     json_format: true,
///     file_path: None,
/// };
///
/// init_logging(&config).unwrap();
/// ```
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(build_filter(config)?);

    let file = match &config.file_path {
        Some(path) => Some(Arc::new(
            OpenOptions::new().create(true).append(true).open(path)?,
        )),
        None => None,
    };

    if config.json_format {
        let console_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr);

        if let Some(file) = file {
            let file_layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(file);
            registry.with(console_layer).with(file_layer).try_init()?;
        } else {
            registry.with(console_layer).try_init()?;
        }
    } else {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr);

        if let Some(file) = file {
            let file_layer = fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .with_writer(file);
            registry.with(console_layer).with(file_layer).try_init()?;
        } else {
            registry.with(console_layer).try_init()?;
        }
    }

    Ok(())
}
