//! Request dispatch.
//!
//! The [`Dispatcher`] turns one buffered request into one buffered response:
//!
//! 1. strip the mount prefix; requests outside it get `404`
//! 2. map the method onto a verb; anything but `GET` and `POST` gets `405`
//! 3. look up the route; a miss gets `404`
//! 4. bind the arguments
//! 5. resolve the handler instance
//! 6. validate; the first violation gets `400` with its message as body
//! 7. set the route's response content type
//! 8. invoke the handler and write its result
//!
//! Any error raised from step 4 on produces `500` with an empty body.
//! Nothing reaches the client before the writer has finished, so a failing
//! request never leaves a partial response behind.

use bytes::Bytes;
use hermes_convert::ResponseSink;
use hermes_core::{
    ConstraintValidator, HermesError, HermesResult, InboundRequest, RequestContext, RequestId,
    Validator, Verb,
};
use hermes_router::{RouteDescriptor, RouteTable};
use http::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use http::{Response, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info_span, Instrument};

/// Mount point used when none is configured: every path.
pub const DEFAULT_MATCHING_URL: &str = "/*";

/// A fully buffered response.
pub type DispatchResponse = Response<Bytes>;

/// Maps requests onto registered routes.
///
/// # Example
///
/// ```
/// use hermes_convert::ConverterRegistry;
/// use hermes_core::{Args, BoxError, InboundRequest};
/// use hermes_router::{Constructors, Resource, ResourceDef, RouteTable};
/// use hermes_server::Dispatcher;
/// use http::{StatusCode, Uri};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Health;
///
/// impl Resource for Health {
///     fn describe(def: &mut ResourceDef<Self>) {
///         def.method("ping", |_: &Self, _: Args| Ok::<_, BoxError>("pong")).get();
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let factory = Constructors::new().with_default::<Health>();
/// let mut table = RouteTable::new(Arc::new(ConverterRegistry::new()), Arc::new(factory));
/// table.add_handler_type::<Health>().unwrap();
///
/// let dispatcher = Dispatcher::new(Arc::new(table)).with_matching_url("/api/*");
/// let request = InboundRequest::builder().uri(Uri::from_static("/api/ping")).build();
/// let response = dispatcher.dispatch(request).await;
///
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(response.body().as_ref(), b"pong");
/// # });
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    table: Arc<RouteTable>,
    validator: Arc<dyn Validator>,
    prefix: String,
}

impl Dispatcher {
    /// Creates a dispatcher mounted at `/*` with the [`ConstraintValidator`].
    #[must_use]
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self {
            table,
            validator: Arc::new(ConstraintValidator),
            prefix: mount_prefix(DEFAULT_MATCHING_URL),
        }
    }

    /// Replaces the validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    /// Sets the mount point, e.g. `/resources/*`.
    ///
    /// Route paths are matched against what follows the part before `/*`.
    #[must_use]
    pub fn with_matching_url(mut self, matching_url: &str) -> Self {
        self.prefix = mount_prefix(matching_url);
        self
    }

    /// Returns the prefix stripped from request paths.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the route table.
    #[must_use]
    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    /// Serves one request.
    pub async fn dispatch(&self, request: InboundRequest) -> DispatchResponse {
        let request_id = RequestId::new();
        let started = Instant::now();
        let span = info_span!(
            "request",
            request_id = %request_id,
            method = %request.method(),
            path = %request.path(),
        );
        async move {
            let response = self.route(Arc::new(request), request_id).await;
            debug!(
                status = response.status().as_u16(),
                elapsed_ms = started.elapsed().as_millis(),
                "request completed"
            );
            response
        }
        .instrument(span)
        .await
    }

    async fn route(&self, request: Arc<InboundRequest>, request_id: RequestId) -> DispatchResponse {
        let Some(route_path) = strip_prefix(&self.prefix, request.path()) else {
            debug!("path outside mount point");
            return status_only(StatusCode::NOT_FOUND);
        };
        let Some(verb) = Verb::from_method(request.method()) else {
            debug!("unsupported method");
            return method_not_allowed();
        };
        let Some(route) = self.table.lookup(verb, route_path).map(Arc::clone) else {
            debug!(route = route_path, "no route");
            return status_only(StatusCode::NOT_FOUND);
        };

        let context = RequestContext::new(Arc::clone(&request), route.path()).with_request_id(request_id);
        match self.serve(&route, &request, &context).await {
            Ok(response) => response,
            Err(e) => {
                error!(
                    route = %route.signature().qualified_name(),
                    category = ?e.category(),
                    error = %e,
                    source = ?std::error::Error::source(&e),
                    "request failed"
                );
                status_only(e.status_code())
            }
        }
    }

    async fn serve(
        &self,
        route: &RouteDescriptor,
        request: &InboundRequest,
        context: &RequestContext,
    ) -> HermesResult<DispatchResponse> {
        let args = route.bind(request, context)?;
        let instance = self.table.instance_for(route.handler_type())?;

        let violations = self.validator.validate(&instance, route.signature(), &args);
        if let Some(first) = violations.into_iter().next() {
            debug!(parameter = %first.parameter, message = %first.message, "validation failed");
            return Ok(bad_request(first.message));
        }

        let mut sink = ResponseSink::new();
        if !route.response_content_type().is_empty() {
            sink.set_content_type(route.response_content_type())?;
        }

        // A panicking handler surfaces as a join error instead of tearing
        // down the connection task.
        let reply = tokio::spawn(route.invoke(instance, args))
            .await
            .map_err(|e| HermesError::handler(route.signature().qualified_name(), e))??;
        route.write(reply, &mut sink)?;

        let (status, headers, body) = sink.into_parts();
        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("prefix", &self.prefix)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

/// Derives the path prefix from a mount URL: `/resources/*` becomes
/// `/resources`, `/*` and `/` become the empty prefix.
#[must_use]
pub fn mount_prefix(matching_url: &str) -> String {
    let prefix = matching_url.strip_suffix("/*").unwrap_or(matching_url);
    prefix.trim_end_matches('/').to_string()
}

/// Returns the route path below `prefix`, or `None` if the request is
/// outside the mount point or addresses the mount point itself.
fn strip_prefix<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || !rest.starts_with('/') {
        return None;
    }
    Some(rest)
}

fn status_only(status: StatusCode) -> DispatchResponse {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status;
    response
}

fn method_not_allowed() -> DispatchResponse {
    let mut response = status_only(StatusCode::METHOD_NOT_ALLOWED);
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static("GET, POST"));
    response
}

fn bad_request(message: String) -> DispatchResponse {
    let mut response = Response::new(Bytes::from(message));
    *response.status_mut() = StatusCode::BAD_REQUEST;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static(hermes_core::media::TEXT_PLAIN),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_convert::ConverterRegistry;
    use hermes_core::media::APPLICATION_JSON;
    use hermes_core::{Args, BoxError, Instance, MethodSignature, NoopValidator, Violation};
    use hermes_router::{Constructors, Param, Resource, ResourceDef};
    use http::{Method, Uri};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Greeter;

    impl Greeter {
        fn hello(&self, mut args: Args) -> Result<serde_json::Value, BoxError> {
            let name: String = args.required(0)?;
            Ok(json!({ "greeting": format!("hello {name}"), "extra": null }))
        }

        fn fail(&self, _args: Args) -> Result<String, BoxError> {
            Err("greeter is tired".into())
        }

        fn panic(&self, _args: Args) -> Result<String, BoxError> {
            panic!("greeter exploded")
        }

        fn echo(&self, mut args: Args) -> Result<Vec<u8>, BoxError> {
            Ok(args.take(0)?.unwrap_or_default())
        }
    }

    impl Resource for Greeter {
        fn describe(def: &mut ResourceDef<Self>) {
            def.path("/greet");
            def.method("hello", Self::hello)
                .get()
                .produces(APPLICATION_JSON)
                .param(Param::of::<String>("name").query("name").not_empty("Name cannot be empty!"));
            def.method("fail", Self::fail).get();
            def.method("panic", Self::panic).get();
            def.method("echo", Self::echo)
                .post()
                .consumes("application/octet-stream")
                .produces("application/octet-stream")
                .param(Param::of::<Vec<u8>>("data"));
        }
    }

    fn dispatcher() -> Dispatcher {
        counting_dispatcher(Arc::new(AtomicUsize::new(0)))
    }

    fn counting_dispatcher(constructed: Arc<AtomicUsize>) -> Dispatcher {
        let factory = Constructors::new().with(move || {
            constructed.fetch_add(1, Ordering::SeqCst);
            Greeter
        });
        let mut table = RouteTable::new(Arc::new(ConverterRegistry::new()), Arc::new(factory));
        table.add_handler_type::<Greeter>().unwrap();
        Dispatcher::new(Arc::new(table)).with_matching_url("/resources/*")
    }

    fn get(uri: &'static str) -> InboundRequest {
        InboundRequest::builder().uri(Uri::from_static(uri)).build()
    }

    #[test]
    fn test_mount_prefix() {
        assert_eq!(mount_prefix("/resources/*"), "/resources");
        assert_eq!(mount_prefix("/*"), "");
        assert_eq!(mount_prefix("/"), "");
        assert_eq!(mount_prefix("/api"), "/api");
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("/resources", "/resources/greet/hello"), Some("/greet/hello"));
        assert_eq!(strip_prefix("/resources", "/resources"), None);
        assert_eq!(strip_prefix("/resources", "/resourcesX/greet"), None);
        assert_eq!(strip_prefix("/resources", "/other"), None);
        assert_eq!(strip_prefix("", "/greet/hello"), Some("/greet/hello"));
        assert_eq!(strip_prefix("", ""), None);
    }

    #[tokio::test]
    async fn test_success_sets_content_type_and_skips_nulls() {
        let response = dispatcher().dispatch(get("/resources/greet/hello?name=Kiev")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], APPLICATION_JSON);
        assert_eq!(response.body().as_ref(), br#"{"greeting":"hello Kiev"}"#);
    }

    #[tokio::test]
    async fn test_unknown_paths_are_not_found() {
        let dispatcher = dispatcher();
        for uri in ["/resources/cars", "/resources", "/greet/hello", "/resources/greet/hello/"] {
            let response = dispatcher.dispatch(get(uri)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
            assert!(response.body().is_empty());
        }
    }

    #[tokio::test]
    async fn test_wrong_verb_for_known_path_is_not_found() {
        let request = InboundRequest::builder()
            .method(Method::POST)
            .uri(Uri::from_static("/resources/greet/hello"))
            .build();
        let response = dispatcher().dispatch(request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let request = InboundRequest::builder()
            .method(Method::DELETE)
            .uri(Uri::from_static("/resources/greet/hello"))
            .build();
        let response = dispatcher().dispatch(request).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, POST");
    }

    #[tokio::test]
    async fn test_head_is_not_served_by_get_routes() {
        let request = InboundRequest::builder()
            .method(Method::HEAD)
            .uri(Uri::from_static("/resources/greet/hello?name=Kiev"))
            .build();
        let response = dispatcher().dispatch(request).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.body().is_empty());
    }

    #[tokio::test]
    async fn test_validation_failure_is_bad_request() {
        let response = dispatcher().dispatch(get("/resources/greet/hello")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(response.body().as_ref(), b"Name cannot be empty!");
    }

    #[tokio::test]
    async fn test_handler_error_is_server_error() {
        let response = dispatcher().dispatch(get("/resources/greet/fail")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body().is_empty());
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn test_handler_panic_is_server_error() {
        let response = dispatcher().dispatch(get("/resources/greet/panic")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body().is_empty());
    }

    #[tokio::test]
    async fn test_octet_stream_echo() {
        let request = InboundRequest::builder()
            .method(Method::POST)
            .uri(Uri::from_static("/resources/greet/echo"))
            .build();
        let response = dispatcher().dispatch(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.body().is_empty());

        let request = InboundRequest::builder()
            .method(Method::POST)
            .uri(Uri::from_static("/resources/greet/echo"))
            .body(vec![9_u8, 8, 7])
            .build();
        let response = dispatcher().dispatch(request).await;
        assert_eq!(response.body().as_ref(), [9, 8, 7]);
    }

    #[tokio::test]
    async fn test_instance_is_created_once() {
        let constructed = Arc::new(AtomicUsize::new(0));
        let dispatcher = counting_dispatcher(Arc::clone(&constructed));
        assert_eq!(constructed.load(Ordering::SeqCst), 0);
        for _ in 0..3 {
            dispatcher.dispatch(get("/resources/greet/hello?name=x")).await;
        }
        assert_eq!(constructed.load(Ordering::SeqCst), 1);
    }

    struct Reject;

    impl Validator for Reject {
        fn validate(&self, _: &Instance, method: &MethodSignature, _: &Args) -> Vec<Violation> {
            vec![
                Violation {
                    parameter: method.method.clone(),
                    message: "first".to_string(),
                },
                Violation {
                    parameter: method.method.clone(),
                    message: "second".to_string(),
                },
            ]
        }
    }

    #[tokio::test]
    async fn test_custom_validator_reports_first_violation() {
        let dispatcher = dispatcher().with_validator(Arc::new(Reject));
        let response = dispatcher.dispatch(get("/resources/greet/fail")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.body().as_ref(), b"first");

        let dispatcher = dispatcher.with_validator(Arc::new(NoopValidator));
        let response = dispatcher.dispatch(get("/resources/greet/hello")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
