//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use http::header::HeaderName;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid TOML for the schema.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Syntactically valid but semantically unusable.
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;

    validate_config(&config)?;

    tracing::info!(
        path = %path.display(),
        proxy = config.proxy,
        "Configuration loaded"
    );
    Ok(config)
}

/// Semantic checks serde cannot express.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if HeaderName::from_bytes(config.proxy_ip_header.as_bytes()).is_err() {
        return Err(ConfigError::Validation(format!(
            "proxy_ip_header {:?} is not a valid header name",
            config.proxy_ip_header
        )));
    }
    Ok(())
}
