//! Tracing subscriber setup driven by `LoggingConfig`

use tracing_subscriber::EnvFilter;

use agency_shared::config::{LogFormat, LoggingConfig};

use crate::InfrastructureError;

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level when it is set.
///
/// # Arguments
/// * `config` - Level, output format and decoration settings
///
/// # Returns
/// * `Err(InfrastructureError::Config)` - A global subscriber is already installed
pub fn init_tracing(config: &LoggingConfig) -> Result<(), InfrastructureError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback_filter(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(config.colored)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    installed.map_err(|e| InfrastructureError::Config(format!("Failed to install tracing: {}", e)))
}

/// Configured directive with noisy dependencies held at `warn`
fn fallback_filter(level: &str) -> EnvFilter {
    let directives = format!("{},sqlx=warn", level);
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"))
}
