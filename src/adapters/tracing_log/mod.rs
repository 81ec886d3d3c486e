// Tracing log adapter - Structured logging using tracing crate

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

use crate::domain::errors::*;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(DomainError::Settings(format!(
                "unknown log format '{}', expected text or json",
                other
            ))),
        }
    }
}

/// Tracing log adapter
pub struct TracingLogAdapter;

impl TracingLogAdapter {
    /// Build the filter for a level or directive string such as `info` or `slicer_cli=debug`
    pub fn filter(level: &str) -> Result<EnvFilter, DomainError> {
        EnvFilter::try_new(level)
            .map_err(|e| DomainError::Settings(format!("invalid log level '{}': {}", level, e)))
    }

    /// Install the global subscriber, writing to stderr.
    ///
    /// Returns `Ok(false)` if a subscriber was already installed.
    pub fn init(level: &str, format: LogFormat) -> Result<bool, DomainError> {
        let filter = Self::filter(level)?;
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false);

        let installed = match format {
            LogFormat::Text => builder.try_init().is_ok(),
            LogFormat::Json => builder.json().try_init().is_ok(),
        };
        Ok(installed)
    }
}
