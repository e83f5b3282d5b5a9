//! Request context types.
//!
//! A [`RequestContext`] is what a context-passthrough parameter receives:
//! the request itself plus the identifier it is logged under.

use crate::request::InboundRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines of one request sortable.
///
/// # Example
///
/// ```
/// use hermes_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-request context handed to context-passthrough parameters.
///
/// Cloning is cheap: the request is shared.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    request: Arc<InboundRequest>,
    route_path: String,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context for a request routed to `route_path`.
    #[must_use]
    pub fn new(request: Arc<InboundRequest>, route_path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            request,
            route_path: route_path.into(),
            started_at: Instant::now(),
        }
    }

    /// Replaces the generated request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the request being served.
    #[must_use]
    pub fn request(&self) -> &InboundRequest {
        &self.request
    }

    /// Returns the route path after the application prefix was stripped.
    #[must_use]
    pub fn route_path(&self) -> &str {
        &self.route_path
    }

    /// Returns the time elapsed since dispatch started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
