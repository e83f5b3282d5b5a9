//! Test response wrapper.

use crate::error::TestError;
use bytes::Bytes;
use hermes_server::DispatchResponse;
use http::{header, HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

/// A buffered dispatcher response with assertion helpers.
#[derive(Debug)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Wraps a dispatcher response.
    pub fn from_dispatch(response: DispatchResponse) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a number.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value if it is valid UTF-8.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Returns the `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    ///
    /// # Errors
    ///
    /// Fails if the body is not UTF-8.
    pub fn text(&self) -> Result<String, TestError> {
        Ok(String::from_utf8(self.body.to_vec())?)
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Fails if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Deserializes the body as an untyped JSON value.
    ///
    /// # Errors
    ///
    /// Fails if the body is not valid JSON.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    /// Asserts the status code.
    ///
    /// # Panics
    ///
    /// Panics on mismatch, printing the body.
    #[track_caller]
    pub fn assert_status(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status_code(),
            expected,
            "unexpected status, body: {}",
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts the `Content-Type` header.
    ///
    /// # Panics
    ///
    /// Panics on mismatch.
    #[track_caller]
    pub fn assert_content_type(&self, expected: &str) -> &Self {
        assert_eq!(self.content_type(), Some(expected), "unexpected content type");
        self
    }

    /// Asserts the exact body text.
    ///
    /// # Panics
    ///
    /// Panics on mismatch.
    #[track_caller]
    pub fn assert_body_eq(&self, expected: &str) -> &Self {
        assert_eq!(String::from_utf8_lossy(&self.body), expected);
        self
    }

    /// Asserts the body is JSON equal to `expected`, ignoring key order.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON or differs.
    #[track_caller]
    pub fn assert_json_eq(&self, expected: &serde_json::Value) -> &Self {
        match self.json_value() {
            Ok(actual) => assert_eq!(&actual, expected),
            Err(e) => panic!("body is not JSON ({e}): {}", String::from_utf8_lossy(&self.body)),
        }
        self
    }

    /// Asserts the body is empty.
    ///
    /// # Panics
    ///
    /// Panics if it is not.
    #[track_caller]
    pub fn assert_empty(&self) -> &Self {
        assert!(
            self.body.is_empty(),
            "expected empty body, got: {}",
            String::from_utf8_lossy(&self.body)
        );
        self
    }
}
