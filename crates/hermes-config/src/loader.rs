//! Layered configuration loading.
//!
//! Layers apply in order, later ones overriding earlier ones:
//! 1. defaults
//! 2. a TOML or JSON file (fields missing from the file keep their default)
//! 3. environment variables `PREFIX__SECTION__KEY`
//!
//! Validation runs last, in [`ConfigLoader::load`].

use std::env;
use std::fs;
use std::path::Path;

use hermes_telemetry::LogFormat;

use crate::{ApplicationConfig, ConfigError};

/// Environment prefix used by [`ConfigLoader::with_env`].
pub const DEFAULT_ENV_PREFIX: &str = "HERMES";

/// Builds an [`ApplicationConfig`] from defaults, a file and the environment.
///
/// ```no_run
/// use hermes_config::ConfigLoader;
///
/// # fn main() -> Result<(), hermes_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("hermes.toml")?
///     .with_env()
///     .load()?;
/// println!("listening on {}", config.http_addr());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: ApplicationConfig,
    env_prefix: Option<String>,
    overrides: Vec<(String, String)>,
}

impl ConfigLoader {
    /// Creates a loader holding the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the starting values. A file loaded afterwards still replaces
    /// them as a whole; environment overrides apply on top.
    #[must_use]
    pub fn with_defaults(mut self, config: ApplicationConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the current values with a file. The format follows the
    /// extension (`.toml` or `.json`).
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, unreadable, malformed or carries
    /// unknown keys.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;
        self.with_string(&content, format)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be used.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Replaces the current values with `content` in the given format
    /// (`toml` or `json`).
    ///
    /// # Errors
    ///
    /// Fails on an unknown format or invalid content.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_ascii_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        Ok(self)
    }

    /// Reads overrides from the process environment under `HERMES__`.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Reads overrides from the process environment under `PREFIX__`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_ascii_uppercase());
        self
    }

    /// Adds explicit `(NAME, value)` overrides, applied after the process
    /// environment. Names use the same `PREFIX__SECTION__KEY` form.
    #[must_use]
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        if self.env_prefix.is_none() {
            self.env_prefix = Some(DEFAULT_ENV_PREFIX.to_string());
        }
        self.overrides
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Applies environment overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Fails on an unparsable override or an invalid final value.
    pub fn load(self) -> Result<ApplicationConfig, ConfigError> {
        let config = self.load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides without validating.
    ///
    /// # Errors
    ///
    /// Fails on an unparsable override.
    pub fn load_unvalidated(mut self) -> Result<ApplicationConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let mut vars: Vec<(String, String)> = env::vars().collect();
            vars.append(&mut self.overrides);
            for (key, value) in &vars {
                self.apply_env_var(&prefix, key, value)?;
            }
        }
        Ok(self.config)
    }

    fn apply_env_var(&mut self, prefix: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        let Some(path) = key
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix("__"))
        else {
            return Ok(());
        };

        let parts: Vec<&str> = path.split("__").collect();
        let config = &mut self.config;
        match parts.as_slice() {
            ["PORT"] => config.port = parse_number(key, value)?,
            ["MATCHING_URL"] => config.matching_url = value.to_string(),

            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "REQUEST_TIMEOUT_SECS"] => {
                config.server.request_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => {
                config.server.max_body_bytes = parse_number(key, value)?;
            }

            ["LOGGING", "ENABLED"] => config.logging.enabled = parse_flag(key, value)?,
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                config.logging.format = match value.to_ascii_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "SPAN_EVENTS"] => config.logging.span_events = parse_flag(key, value)?,
            ["LOGGING", "FILE_LINE_INFO"] => {
                config.logging.file_line_info = parse_flag(key, value)?;
            }
            ["LOGGING", "THREAD_IDS"] => config.logging.thread_ids = parse_flag(key, value)?,
            ["LOGGING", "INCLUDE_TARGET"] => {
                config.logging.include_target = parse_flag(key, value)?;
            }

            // Unrelated variables sharing the prefix are ignored.
            _ => {}
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, format!("expected integer, got '{value}'")))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse_error(key, "expected boolean")),
    }
}
