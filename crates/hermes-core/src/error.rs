//! Error types for Hermes.
//!
//! [`HermesError`] is the single error type shared by the registry, the
//! route table and the dispatcher. Assembly-time variants abort startup;
//! runtime variants are normalized to a status code at the dispatch boundary
//! and never reach the client verbatim.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`HermesError`].
pub type HermesResult<T> = Result<T, HermesError>;

/// Boxed error accepted from handlers and instance factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Invalid resource declaration or application settings.
    Configuration,
    /// A request value could not be converted, decoded or encoded.
    Conversion,
    /// A handler instance could not be produced.
    Instance,
    /// The handler itself failed.
    Handler,
    /// Transport-level failure.
    Io,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    ///
    /// Everything that can happen while serving a request is a server error:
    /// conversion failures are not reported as client errors.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Configuration
            | Self::Conversion
            | Self::Instance
            | Self::Handler
            | Self::Io => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` if errors of this category must abort startup.
    #[must_use]
    pub const fn is_fatal_at_startup(&self) -> bool {
        matches!(self, Self::Configuration)
    }
}

/// Standard error type for Hermes.
///
/// # Example
///
/// ```
/// use hermes_core::{ErrorCategory, HermesError};
///
/// let error = HermesError::unknown_converter("my_app::UserId");
/// assert_eq!(error.category(), ErrorCategory::Configuration);
/// ```
#[derive(Error, Debug)]
pub enum HermesError {
    /// No incoming converter is registered for a parameter type.
    #[error("no incoming converter registered for type {type_name}")]
    UnknownConverter {
        /// Name of the parameter type.
        type_name: String,
    },

    /// A parameter declares a source the engine cannot bind.
    #[error("unsupported binding for parameter '{parameter}' of {route}: {reason}")]
    UnsupportedBinding {
        /// The method declaring the parameter (`Type::method`).
        route: String,
        /// The declared parameter name.
        parameter: String,
        /// What is not supported.
        reason: String,
    },

    /// A value could not be converted to or from its wire form.
    #[error("conversion error: {message}")]
    Conversion {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<BoxError>,
    },

    /// A handler instance could not be created or has the wrong type.
    #[error("instance error for {type_name}: {message}")]
    Instance {
        /// Name of the handler type.
        type_name: String,
        /// Human-readable error message.
        message: String,
        /// The underlying error, if the factory reported one.
        #[source]
        source: Option<BoxError>,
    },

    /// The invoked handler failed.
    #[error("handler {route} failed")]
    Handler {
        /// The method that failed (`Type::method`).
        route: String,
        /// The error returned by the handler.
        #[source]
        source: BoxError,
    },

    /// Invalid application settings or resource declaration.
    #[error("configuration error: {message}")]
    Configuration {
        /// Human-readable error message.
        message: String,
    },

    /// Transport-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HermesError {
    /// Creates an unknown converter error.
    #[must_use]
    pub fn unknown_converter(type_name: impl Into<String>) -> Self {
        Self::UnknownConverter {
            type_name: type_name.into(),
        }
    }

    /// Creates an unsupported binding error.
    #[must_use]
    pub fn unsupported_binding(
        route: impl Into<String>,
        parameter: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnsupportedBinding {
            route: route.into(),
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Creates a conversion error.
    #[must_use]
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a conversion error with a source error.
    pub fn conversion_with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Conversion {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates an instance error.
    #[must_use]
    pub fn instance(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Instance {
            type_name: type_name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates an instance error with the factory's error as source.
    pub fn instance_with_source(type_name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Instance {
            type_name: type_name.into(),
            message: "factory failed".to_string(),
            source: Some(source.into()),
        }
    }

    /// Wraps an error returned by a handler.
    pub fn handler(route: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Handler {
            route: route.into(),
            source: source.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownConverter { .. }
            | Self::UnsupportedBinding { .. }
            | Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Conversion { .. } => ErrorCategory::Conversion,
            Self::Instance { .. } => ErrorCategory::Instance,
            Self::Handler { .. } => ErrorCategory::Handler,
            Self::Io(_) => ErrorCategory::Io,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }
}
