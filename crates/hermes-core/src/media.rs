//! Media types with a built-in body codec.

use std::fmt;

/// `application/json`
pub const APPLICATION_JSON: &str = "application/json";
/// `text/plain`
pub const TEXT_PLAIN: &str = "text/plain";
/// `application/octet-stream`
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

/// Closed set of media types the engine has codecs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Structured JSON.
    Json,
    /// Raw UTF-8 text.
    PlainText,
    /// Raw bytes.
    OctetStream,
}

impl MediaKind {
    /// Resolves a content-type string by its MIME essence.
    ///
    /// Parameters such as `charset` are ignored. Returns `None` for media
    /// types without a built-in codec and for unparseable strings.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let parsed: mime::Mime = content_type.trim().parse().ok()?;
        match parsed.essence_str() {
            APPLICATION_JSON => Some(Self::Json),
            TEXT_PLAIN => Some(Self::PlainText),
            APPLICATION_OCTET_STREAM => Some(Self::OctetStream),
            _ => None,
        }
    }

    /// Returns the canonical content-type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => APPLICATION_JSON,
            Self::PlainText => TEXT_PLAIN,
            Self::OctetStream => APPLICATION_OCTET_STREAM,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
