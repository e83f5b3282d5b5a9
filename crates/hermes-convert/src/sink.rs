//! The response under construction.
//!
//! Outgoing writers populate a [`ResponseSink`]; the transport turns it into
//! an HTTP response once the writer returns successfully. Nothing is sent
//! before that, so a failing writer leaves no partial response behind.

use bytes::{Bytes, BytesMut};
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use hermes_core::{HermesError, HermesResult};

/// Buffered status, headers and body of a response.
#[derive(Debug, Clone)]
pub struct ResponseSink {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl Default for ResponseSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink {
    /// Creates an empty `200 OK` sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the current content type, if one was set.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Sets the content type, replacing any previous value.
    pub fn set_content_type(&mut self, content_type: &str) -> HermesResult<()> {
        let value = HeaderValue::from_str(content_type).map_err(|e| {
            HermesError::conversion_with_source(format!("invalid content type '{content_type}'"), e)
        })?;
        self.headers.insert(header::CONTENT_TYPE, value);
        Ok(())
    }

    /// Appends a header, keeping earlier values with the same name.
    pub fn add_header(&mut self, name: &str, value: &str) -> HermesResult<()> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            HermesError::conversion_with_source(format!("invalid header name '{name}'"), e)
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            HermesError::conversion_with_source(format!("invalid value for header '{name}'"), e)
        })?;
        self.headers.append(name, value);
        Ok(())
    }

    /// Appends bytes to the body.
    pub fn write(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    /// Returns the body written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consumes the sink.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let sink = ResponseSink::new();
        assert_eq!(sink.status(), StatusCode::OK);
        assert!(sink.content_type().is_none());
        assert!(sink.body().is_empty());
    }

    #[test]
    fn test_headers_append() {
        let mut sink = ResponseSink::new();
        sink.add_header("set-cookie", "a=1").unwrap();
        sink.add_header("set-cookie", "b=2").unwrap();
        assert_eq!(sink.headers().get_all("set-cookie").iter().count(), 2);
    }

    #[test]
    fn test_invalid_header_is_error() {
        let mut sink = ResponseSink::new();
        assert!(sink.add_header("bad header", "x").is_err());
        assert!(sink.add_header("x-ok", "line\nbreak").is_err());
    }

    #[test]
    fn test_into_parts() {
        let mut sink = ResponseSink::new();
        sink.set_status(StatusCode::CREATED);
        sink.set_content_type("text/plain").unwrap();
        sink.write(b"hello ");
        sink.write(b"world");

        let (status, headers, body) = sink.into_parts();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
        assert_eq!(body, Bytes::from_static(b"hello world"));
    }
}
