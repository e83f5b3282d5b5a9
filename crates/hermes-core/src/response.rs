//! Handler-controlled responses.
//!
//! A handler that returns [`ResourceResponse`] decides the status code,
//! headers and cookies itself; any other return type is written as a
//! `200` entity.

use crate::error::{HermesError, HermesResult};
use http::StatusCode;
use serde::Serialize;

/// A cookie to set on the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
}

impl ResponseCookie {
    /// Renders the `Set-Cookie` header value.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// A complete response description returned by a handler.
///
/// # Example
///
/// ```
/// use hermes_core::ResourceResponse;
///
/// let response = ResourceResponse::ok()
///     .header("x-source", "cache")
///     .entity(&vec![1, 2, 3])
///     .unwrap()
///     .build();
///
/// assert_eq!(response.status_code(), 200);
/// assert!(response.has_entity());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceResponse {
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_type: Option<String>,
    headers: Vec<(String, String)>,
    cookies: Vec<ResponseCookie>,
}

impl ResourceResponse {
    /// Starts a `200 OK` response.
    #[must_use]
    pub fn ok() -> ResourceResponseBuilder {
        Self::status(StatusCode::OK)
    }

    /// Starts a response with the given status.
    #[must_use]
    pub fn status(status: StatusCode) -> ResourceResponseBuilder {
        ResourceResponseBuilder {
            response: Self {
                status: status.as_u16(),
                entity: None,
                media_type: None,
                headers: Vec::new(),
                cookies: Vec::new(),
            },
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// Returns the entity, if any.
    #[must_use]
    pub fn entity(&self) -> Option<&serde_json::Value> {
        self.entity.as_ref()
    }

    /// Returns `true` if an entity was set.
    #[must_use]
    pub fn has_entity(&self) -> bool {
        self.entity.is_some()
    }

    /// Returns the media type the entity should be encoded with.
    #[must_use]
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    /// Returns the headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Returns the cookies in insertion order.
    #[must_use]
    pub fn cookies(&self) -> &[ResponseCookie] {
        &self.cookies
    }
}

/// Builder returned by [`ResourceResponse::ok`] and [`ResourceResponse::status`].
#[derive(Debug, Clone)]
pub struct ResourceResponseBuilder {
    response: ResourceResponse,
}

impl ResourceResponseBuilder {
    /// Sets the entity, serializing it eagerly.
    pub fn entity<T: Serialize + ?Sized>(mut self, entity: &T) -> HermesResult<Self> {
        let value = serde_json::to_value(entity)
            .map_err(|e| HermesError::conversion_with_source("entity is not serializable", e))?;
        self.response.entity = Some(value);
        Ok(self)
    }

    /// Sets the media type used to encode the entity.
    #[must_use]
    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.response.media_type = Some(media_type.into());
        self
    }

    /// Appends a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.response.headers.push((name.into(), value.to_string()));
        self
    }

    /// Appends a cookie.
    #[must_use]
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.response.cookies.push(ResponseCookie {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Finishes the response.
    #[must_use]
    pub fn build(self) -> ResourceResponse {
        self.response
    }
}

impl ResourceResponse {
    /// Returns the status code as [`StatusCode`].
    ///
    /// Codes outside the valid range fall back to `500`.
    #[must_use]
    pub fn status_code_typed(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
