//! Structured logging setup
//!
//! Logs go to stderr so that `resolve-dns` can print its document on
//! stdout. `RUST_LOG`, when set, overrides the configured level.

use std::fmt;
use std::str::FromStr;

use etherip_sync_common::{SyncError, SyncResult};
use tracing::Level;

/// Log line encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Multi-line human-readable output
    Pretty,
}

impl FromStr for LogFormat {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(SyncError::invalid_config(
                "log_format",
                format!("unknown format '{}', expected json or pretty", other),
            )),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Json => f.write_str("json"),
            LogFormat::Pretty => f.write_str("pretty"),
        }
    }
}

/// Parses a level name such as `info` or `DEBUG`
pub fn parse_level(level: &str) -> SyncResult<Level> {
    Level::from_str(level).map_err(|_| {
        SyncError::invalid_config("log_level", format!("failed to parse log level: {}", level))
    })
}

/// Installs the global subscriber
///
/// # Errors
///
/// Fails on an unknown level name or if a subscriber is already installed.
pub fn init_logging(log_level: &str, format: LogFormat) -> SyncResult<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = parse_level(log_level)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_ascii_lowercase()));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .json(),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .pretty(),
            )
            .try_init(),
    };
    result.map_err(|e| SyncError::internal(format!("failed to install logger: {}", e)))
}
