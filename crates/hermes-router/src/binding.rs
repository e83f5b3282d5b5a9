//! Parameter declarations and their resolved bindings.
//!
//! A [`Param`] records every marker a handler parameter was declared with;
//! resolution picks exactly one [`ParamBinding`] from them.

use hermes_convert::Decoder;
use hermes_core::{ArgValue, Constraint, HermesResult, InboundRequest, RequestContext, Verb};
use serde::de::DeserializeOwned;
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Decodes a whole request body into the parameter's declared type.
pub(crate) type BodyDecode = Arc<dyn Fn(Decoder, &[u8]) -> HermesResult<ArgValue> + Send + Sync>;

/// The source a handler argument is bound from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamBinding {
    /// The [`RequestContext`] itself.
    Context,
    /// A named query parameter.
    Query {
        /// Query parameter name.
        key: String,
        /// Raw value used when the parameter is absent.
        default: Option<String>,
    },
    /// A named header.
    Header {
        /// Header name.
        key: String,
        /// Raw value used when the header is absent.
        default: Option<String>,
    },
    /// A named cookie.
    Cookie {
        /// Cookie name.
        key: String,
        /// Raw value used when the cookie is absent.
        default: Option<String>,
    },
    /// An unmarked parameter of a verb without body, looked up by its
    /// declared name among the request parameters.
    RequestParam {
        /// The declared parameter name.
        key: String,
        /// Raw value used when the parameter is absent.
        default: Option<String>,
    },
    /// The whole request body, decoded with the route's request content type.
    Body {
        /// Content type selecting the decoder.
        content_type: String,
    },
}

impl ParamBinding {
    /// Looks up the raw value of a named binding, falling back to its default.
    ///
    /// Always `None` for context and body bindings.
    #[must_use]
    pub fn lookup<'a>(&'a self, request: &'a InboundRequest) -> Option<&'a str> {
        let (found, default) = match self {
            Self::Query { key, default } | Self::RequestParam { key, default } => {
                (request.query_param(key), default)
            }
            Self::Header { key, default } => (request.header(key), default),
            Self::Cookie { key, default } => (request.cookie(key), default),
            Self::Context | Self::Body { .. } => return None,
        };
        found.or(default.as_deref())
    }

    /// Returns the source key of a named binding.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Query { key, .. }
            | Self::Header { key, .. }
            | Self::Cookie { key, .. }
            | Self::RequestParam { key, .. } => Some(key),
            Self::Context | Self::Body { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Markers {
    context: bool,
    query: Option<String>,
    header: Option<String>,
    cookie: Option<String>,
    path: Option<String>,
    form: Option<String>,
}

/// Declaration of one handler parameter.
///
/// # Example
///
/// ```
/// use hermes_router::Param;
///
/// let day = Param::of::<i32>("day").query("day").default_value("1");
/// let year = Param::of::<i64>("year").header("year");
/// let body = Param::of::<String>("time").not_empty("time is required");
/// # let _ = (day, year, body);
/// ```
#[derive(Clone)]
pub struct Param {
    name: String,
    type_id: TypeId,
    type_name: &'static str,
    decode: Option<BodyDecode>,
    markers: Markers,
    default_value: Option<String>,
    constraints: Vec<Constraint>,
}

impl Param {
    /// Declares a parameter of type `T`.
    ///
    /// `T` is converted with the registry's incoming converter when bound to a
    /// named source, or decoded with serde when bound to the body.
    #[must_use]
    pub fn of<T>(name: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Any + Send + Sync,
    {
        let decode: BodyDecode = Arc::new(|decoder: Decoder, body: &[u8]| {
            Ok(decoder
                .decode::<T>(body)?
                .map(|value| Box::new(value) as Box<dyn Any + Send + Sync>))
        });
        Self {
            name: name.into(),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            decode: Some(decode),
            markers: Markers::default(),
            default_value: None,
            constraints: Vec::new(),
        }
    }

    /// Declares a context-passthrough parameter receiving the [`RequestContext`].
    #[must_use]
    pub fn context(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: TypeId::of::<RequestContext>(),
            type_name: type_name::<RequestContext>(),
            decode: None,
            markers: Markers {
                context: true,
                ..Markers::default()
            },
            default_value: None,
            constraints: Vec::new(),
        }
    }

    /// Marks the parameter as context passthrough.
    #[must_use]
    pub fn passthrough(mut self) -> Self {
        self.markers.context = true;
        self
    }

    /// Binds the parameter to a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>) -> Self {
        self.markers.query = Some(key.into());
        self
    }

    /// Binds the parameter to a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>) -> Self {
        self.markers.header = Some(key.into());
        self
    }

    /// Binds the parameter to a cookie.
    #[must_use]
    pub fn cookie(mut self, key: impl Into<String>) -> Self {
        self.markers.cookie = Some(key.into());
        self
    }

    /// Binds the parameter to a path segment. Registration fails.
    #[must_use]
    pub fn path_param(mut self, key: impl Into<String>) -> Self {
        self.markers.path = Some(key.into());
        self
    }

    /// Binds the parameter to a form field. Registration fails.
    #[must_use]
    pub fn form(mut self, key: impl Into<String>) -> Self {
        self.markers.form = Some(key.into());
        self
    }

    /// Sets the raw value used when a named source is absent.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Requires the bound value to be present.
    #[must_use]
    pub fn not_null(mut self, message: impl Into<String>) -> Self {
        self.constraints.push(Constraint::not_null(message));
        self
    }

    /// Requires the bound value to be present and non-empty.
    #[must_use]
    pub fn not_empty(mut self, message: impl Into<String>) -> Self {
        self.constraints.push(Constraint::not_empty(message));
        self
    }

    /// Adds an arbitrary constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Returns the declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub(crate) fn body_decode(&self) -> Option<&BodyDecode> {
        self.decode.as_ref()
    }

    pub(crate) fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Picks the binding by marker precedence: context, query, header,
    /// cookie, then the unsupported path and form markers, then the verb's
    /// fallback.
    ///
    /// Returns the reason when the winning marker cannot be bound.
    pub(crate) fn resolve(
        &self,
        verb: Verb,
        request_content_type: &str,
    ) -> Result<ParamBinding, &'static str> {
        let default = self.default_value.clone();
        let markers = &self.markers;
        if markers.context {
            if self.type_id != TypeId::of::<RequestContext>() {
                return Err("context parameters must be declared as RequestContext");
            }
            return Ok(ParamBinding::Context);
        }
        if let Some(key) = &markers.query {
            return Ok(ParamBinding::Query {
                key: key.clone(),
                default,
            });
        }
        if let Some(key) = &markers.header {
            return Ok(ParamBinding::Header {
                key: key.clone(),
                default,
            });
        }
        if let Some(key) = &markers.cookie {
            return Ok(ParamBinding::Cookie {
                key: key.clone(),
                default,
            });
        }
        if markers.path.is_some() {
            return Err("path parameters are not supported");
        }
        if markers.form.is_some() {
            return Err("form parameters are not supported");
        }
        if verb.supports_body() {
            Ok(ParamBinding::Body {
                content_type: request_content_type.to_string(),
            })
        } else {
            Ok(ParamBinding::RequestParam {
                key: self.name.clone(),
                default,
            })
        }
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("name", &self.name)
            .field("type", &self.type_name)
            .field("markers", &self.markers)
            .field("default_value", &self.default_value)
            .field("constraints", &self.constraints)
            .finish_non_exhaustive()
    }
}
