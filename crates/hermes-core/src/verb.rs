//! HTTP verbs understood by the dispatch engine.

use http::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The HTTP method category of a route.
///
/// The set is closed: a request with any other method never reaches the
/// route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    /// `GET`, carries no body.
    Get,
    /// `POST`, body-capable.
    Post,
}

impl Verb {
    /// All supported verbs, in `Allow` header order.
    pub const ALL: [Verb; 2] = [Verb::Get, Verb::Post];

    /// Returns `true` if requests with this verb carry a body.
    ///
    /// Decides whether an unmarked parameter binds to the body or to the
    /// catch-all request parameter source.
    #[must_use]
    pub const fn supports_body(&self) -> bool {
        match self {
            Self::Get => false,
            Self::Post => true,
        }
    }

    /// Maps an HTTP method onto a verb.
    #[must_use]
    pub fn from_method(method: &Method) -> Option<Self> {
        if method == Method::GET {
            Some(Self::Get)
        } else if method == Method::POST {
            Some(Self::Post)
        } else {
            None
        }
    }

    /// Returns the corresponding HTTP method.
    #[must_use]
    pub fn as_method(&self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
        }
    }

    /// Returns the method name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
