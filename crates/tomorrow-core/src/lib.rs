pub mod config;
pub mod error;

pub use config::{
    Config, ConfigValidationError, FeaturedConfig, LocationConfig, ValidationResult,
    WeatherConfig,
};
pub use error::{AppError, ConfigError};

use anyhow::Result;

/// Initialize tracing for the process.
///
/// Honors `RUST_LOG`, defaulting to `info`. Safe to call more than once.
pub fn init() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    tracing::debug!("Tomorrow core initialized");
    Ok(())
}
