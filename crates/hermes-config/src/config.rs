//! Application configuration types.

use hermes_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 8080;

/// Mount point used when none is configured: every path is dispatched.
pub const DEFAULT_MATCHING_URL: &str = "/*";

/// Complete application configuration.
///
/// Every field has a default, so an empty file is a valid configuration.
/// Unknown keys are rejected.
///
/// ```
/// use hermes_config::ApplicationConfig;
///
/// let config = ApplicationConfig::default();
/// assert_eq!(config.port, 8080);
/// assert_eq!(config.matching_url, "/*");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApplicationConfig {
    /// TCP port to listen on, on all interfaces.
    pub port: u16,

    /// URL pattern the dispatcher is mounted on, e.g. `/resources/*`.
    pub matching_url: String,

    /// Transport limits and timeouts.
    pub server: ServerSection,

    /// Logging setup.
    pub logging: LogConfig,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            matching_url: DEFAULT_MATCHING_URL.to_string(),
            server: ServerSection::default(),
            logging: LogConfig::default(),
        }
    }
}

impl ApplicationConfig {
    /// Checks the values that cannot be expressed in the type.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the port is `0` or `65535`,
    /// when the matching URL is empty or does not start with `/`, or when a
    /// server limit is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_port(self.port)?;
        validate_matching_url(&self.matching_url)?;
        self.server.validate()
    }

    /// Listen address derived from the port.
    #[must_use]
    pub fn http_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

/// `[server]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Seconds to wait for open connections after shutdown is requested.
    pub shutdown_timeout_secs: u64,

    /// Seconds allowed for reading a request body.
    pub request_timeout_secs: u64,

    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            shutdown_timeout_secs: 30,
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl ServerSection {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_secs",
                "must be greater than zero",
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Accepts ports strictly between `0` and `65535`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for `0` and `65535`.
pub fn validate_port(port: u16) -> Result<(), ConfigError> {
    if port == 0 || port == u16::MAX {
        return Err(ConfigError::invalid_value(
            "port",
            format!("{port} is out of range, expected 1..=65534"),
        ));
    }
    Ok(())
}

/// Accepts non-empty URL patterns starting with `/`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] otherwise.
pub fn validate_matching_url(url: &str) -> Result<(), ConfigError> {
    if url.is_empty() {
        return Err(ConfigError::invalid_value("matching_url", "must not be empty"));
    }
    if !url.starts_with('/') {
        return Err(ConfigError::invalid_value(
            "matching_url",
            format!("'{url}' must start with '/'"),
        ));
    }
    Ok(())
}
