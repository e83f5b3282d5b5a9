//! Test request building.

use crate::error::TestError;
use bytes::Bytes;
use hermes_core::media::APPLICATION_JSON;
use hermes_core::InboundRequest;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, COOKIE};
use http::{HeaderMap, Method, Uri};
use serde::Serialize;

/// Builds an [`InboundRequest`] for the dispatcher.
///
/// Header problems are remembered and reported by [`build`](Self::build)
/// so the builder chain stays infallible.
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    cookies: Vec<String>,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a builder for `method` and `uri`. The URI may carry a query.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            cookies: Vec::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    /// Shorthand for a GET builder.
    pub fn get(uri: impl AsRef<str>) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Shorthand for a POST builder.
    pub fn post(uri: impl AsRef<str>) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Appends a query parameter; the value is percent-encoded.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Appends a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        match (
            HeaderName::try_from(name),
            HeaderValue::try_from(value.as_ref()),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => {
                self.error
                    .get_or_insert(TestError::InvalidHeader(name.to_string()));
            }
        }
        self
    }

    /// Adds a cookie; all cookies are sent in one `Cookie` header.
    pub fn cookie(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.cookies
            .push(format!("{}={}", name.as_ref(), value.as_ref()));
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and `Content-Type: application/json`.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Bytes::from(bytes),
            Err(e) => {
                self.error.get_or_insert(TestError::Json(e));
            }
        }
        self.content_type(APPLICATION_JSON)
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// Returns the first header or serialization error recorded by the
    /// builder, or [`TestError::InvalidUri`].
    pub fn build(mut self) -> Result<InboundRequest, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut uri = self.uri;
        if !self.query.is_empty() {
            let encoded = serde_urlencoded::to_string(&self.query)?;
            uri.push(if uri.contains('?') { '&' } else { '?' });
            uri.push_str(&encoded);
        }
        let parsed: Uri = uri.parse().map_err(|e: http::uri::InvalidUri| TestError::InvalidUri {
            uri: uri.clone(),
            reason: e.to_string(),
        })?;

        if !self.cookies.is_empty() {
            let value = HeaderValue::try_from(self.cookies.join("; "))
                .map_err(|_| TestError::InvalidHeader(COOKIE.to_string()))?;
            self.headers.insert(COOKIE, value);
        }

        Ok(InboundRequest::new(self.method, parsed, self.headers, self.body))
    }
}
