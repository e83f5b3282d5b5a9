//! Typed configuration for Hermes applications.
//!
//! [`ApplicationConfig`] holds the listening port, the URL pattern the
//! dispatcher is mounted on, transport limits and the logging setup.
//! [`ConfigLoader`] layers defaults, a file and environment variables.
//!
//! # File format
//!
//! ```toml
//! port = 8080
//! matching_url = "/resources/*"
//!
//! [server]
//! shutdown_timeout_secs = 30
//! request_timeout_secs = 30
//! max_body_bytes = 2097152
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment overrides
//!
//! - `HERMES__PORT=9000`
//! - `HERMES__MATCHING_URL=/api/*`
//! - `HERMES__SERVER__MAX_BODY_BYTES=65536`
//! - `HERMES__LOGGING__LEVEL=debug`

#![doc(html_root_url = "https://docs.rs/hermes-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{
    validate_matching_url, validate_port, ApplicationConfig, ServerSection, DEFAULT_MATCHING_URL,
    DEFAULT_PORT,
};
pub use error::ConfigError;
pub use hermes_telemetry::{LogConfig, LogFormat};
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
