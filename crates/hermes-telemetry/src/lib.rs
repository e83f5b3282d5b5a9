//! Structured logging for Hermes services.
//!
//! Every Hermes crate logs through [`tracing`]. This crate installs the
//! process-wide subscriber: an [`EnvFilter`](tracing_subscriber::EnvFilter)
//! built from [`LogConfig::level`] and a JSON or human-readable `fmt` layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use hermes_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(port = 8080, "starting");
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
