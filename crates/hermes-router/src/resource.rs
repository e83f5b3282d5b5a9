//! Resource declarations.
//!
//! A handler type implements [`Resource`] and describes its routes on a
//! [`ResourceDef`]: class-level path and content types, then one
//! [`MethodDecl`] per handler method. [`parse`] turns the declaration into
//! [`RouteDescriptor`]s.
//!
//! ```
//! use hermes_core::{Args, BoxError};
//! use hermes_convert::ConverterRegistry;
//! use hermes_router::{parse, Param, Resource, ResourceDef};
//!
//! struct RunService;
//!
//! impl RunService {
//!     fn workouts(&self, mut args: Args) -> Result<Vec<i64>, BoxError> {
//!         let day: i32 = args.take(0)?.unwrap_or_default();
//!         Ok(vec![i64::from(day)])
//!     }
//! }
//!
//! impl Resource for RunService {
//!     fn describe(def: &mut ResourceDef<Self>) {
//!         def.path("/run");
//!         def.method("workouts", Self::workouts)
//!             .get()
//!             .path("/workouts")
//!             .param(Param::of::<i32>("day").query("day"));
//!     }
//! }
//!
//! let routes = parse::<RunService>(&ConverterRegistry::new()).unwrap();
//! assert_eq!(routes[0].path(), "/run/workouts");
//! assert_eq!(routes[0].response_content_type(), "text/plain");
//! ```

use crate::binding::{Param, ParamBinding};
use crate::descriptor::{BoundParam, BoxFuture, Conversion, MethodHandle, RouteDescriptor};
use hermes_convert::{ConverterRegistry, OutgoingWriter, Reply};
use hermes_core::media::TEXT_PLAIN;
use hermes_core::{
    Args, BoxError, HandlerType, HermesError, HermesResult, Instance, MethodSignature,
    ParamSignature, Verb,
};
use serde::Serialize;
use std::any::{type_name, Any};
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

/// A type whose methods serve HTTP routes.
pub trait Resource: Send + Sync + Sized + 'static {
    /// Declares the type's routes.
    fn describe(def: &mut ResourceDef<Self>);
}

type WriterFor = fn(&ConverterRegistry) -> OutgoingWriter;

/// Declaration of one handler method.
///
/// Methods without a verb are not routes and are skipped.
pub struct MethodDecl {
    name: String,
    verb: Option<Verb>,
    path: Option<String>,
    consumes: Option<String>,
    produces: Option<String>,
    params: Vec<Param>,
    handle: MethodHandle,
    writer: WriterFor,
    return_type: &'static str,
}

impl MethodDecl {
    /// Marks the method as a `GET` route.
    pub fn get(&mut self) -> &mut Self {
        self.verb(Verb::Get)
    }

    /// Marks the method as a `POST` route.
    pub fn post(&mut self) -> &mut Self {
        self.verb(Verb::Post)
    }

    /// Sets the route verb.
    pub fn verb(&mut self, verb: Verb) -> &mut Self {
        self.verb = Some(verb);
        self
    }

    /// Sets the method path, appended to the resource path.
    pub fn path(&mut self, path: impl Into<String>) -> &mut Self {
        self.path = Some(path.into());
        self
    }

    /// Overrides the request content type.
    pub fn consumes(&mut self, media: impl Into<String>) -> &mut Self {
        self.consumes = Some(media.into());
        self
    }

    /// Overrides the response content type.
    pub fn produces(&mut self, media: impl Into<String>) -> &mut Self {
        self.produces = Some(media.into());
        self
    }

    /// Declares the next positional parameter.
    pub fn param(&mut self, param: Param) -> &mut Self {
        self.params.push(param);
        self
    }

    /// Returns the method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for MethodDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDecl")
            .field("name", &self.name)
            .field("verb", &self.verb)
            .field("path", &self.path)
            .field("consumes", &self.consumes)
            .field("produces", &self.produces)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

/// The declaration table of a [`Resource`].
pub struct ResourceDef<H> {
    path: Option<String>,
    consumes: Option<String>,
    produces: Option<String>,
    methods: Vec<MethodDecl>,
    _handler: PhantomData<fn() -> H>,
}

impl<H: Resource> Default for ResourceDef<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Resource> ResourceDef<H> {
    /// Creates an empty declaration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: None,
            consumes: None,
            produces: None,
            methods: Vec::new(),
            _handler: PhantomData,
        }
    }

    /// Sets the path prefix shared by all methods.
    pub fn path(&mut self, path: impl Into<String>) -> &mut Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the default request content type.
    pub fn consumes(&mut self, media: impl Into<String>) -> &mut Self {
        self.consumes = Some(media.into());
        self
    }

    /// Sets the default response content type.
    pub fn produces(&mut self, media: impl Into<String>) -> &mut Self {
        self.produces = Some(media.into());
        self
    }

    /// Declares a synchronous handler method.
    pub fn method<R, E, F>(&mut self, name: impl Into<String>, handler: F) -> &mut MethodDecl
    where
        R: Serialize + Any + Send,
        E: Into<BoxError> + 'static,
        F: Fn(&H, Args) -> Result<R, E> + Send + Sync + 'static,
    {
        let name = name.into();
        let route = qualified::<H>(&name);
        let handler = Arc::new(handler);
        let handle: MethodHandle = Arc::new(move |instance: Instance, args: Args| -> BoxFuture<HermesResult<Reply>> {
            let handler = Arc::clone(&handler);
            let route = route.clone();
            Box::pin(async move {
                let target = downcast_instance::<H>(instance)?;
                handler(&*target, args)
                    .map(|value| Box::new(value) as Reply)
                    .map_err(|e| HermesError::handler(route, e))
            })
        });
        self.push::<R>(name, handle)
    }

    /// Declares an asynchronous handler method.
    pub fn method_async<R, E, F, Fut>(&mut self, name: impl Into<String>, handler: F) -> &mut MethodDecl
    where
        R: Serialize + Any + Send,
        E: Into<BoxError> + 'static,
        F: Fn(Arc<H>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let name = name.into();
        let route = qualified::<H>(&name);
        let handler = Arc::new(handler);
        let handle: MethodHandle = Arc::new(move |instance: Instance, args: Args| -> BoxFuture<HermesResult<Reply>> {
            let handler = Arc::clone(&handler);
            let route = route.clone();
            Box::pin(async move {
                let target = downcast_instance::<H>(instance)?;
                handler(target, args)
                    .await
                    .map(|value| Box::new(value) as Reply)
                    .map_err(|e| HermesError::handler(route, e))
            })
        });
        self.push::<R>(name, handle)
    }

    fn push<R: Serialize + Any + Send>(&mut self, name: String, handle: MethodHandle) -> &mut MethodDecl {
        self.methods.push(MethodDecl {
            name,
            verb: None,
            path: None,
            consumes: None,
            produces: None,
            params: Vec::new(),
            handle,
            writer: ConverterRegistry::outgoing_for::<R>,
            return_type: type_name::<R>(),
        });
        let last = self.methods.len() - 1;
        &mut self.methods[last]
    }

    /// Returns the declared methods.
    #[must_use]
    pub fn methods(&self) -> &[MethodDecl] {
        &self.methods
    }

    fn into_routes(self, registry: &ConverterRegistry) -> HermesResult<Vec<RouteDescriptor>> {
        let handler = HandlerType::of::<H>();
        let mut routes = Vec::with_capacity(self.methods.len());
        for method in self.methods {
            let Some(verb) = method.verb else {
                trace!(handler = %handler, method = %method.name, "skipping method without verb");
                continue;
            };
            let path = route_path(self.path.as_deref(), method.path.as_deref(), &method.name);
            let request_content_type = method
                .consumes
                .or_else(|| self.consumes.clone())
                .unwrap_or_else(|| TEXT_PLAIN.to_string());
            let response_content_type = method
                .produces
                .or_else(|| self.produces.clone())
                .unwrap_or_else(|| TEXT_PLAIN.to_string());
            let route = format!("{}::{}", handler.short_name(), method.name);

            let mut params = Vec::with_capacity(method.params.len());
            let mut signature = Vec::with_capacity(method.params.len());
            for param in method.params {
                let binding = param
                    .resolve(verb, &request_content_type)
                    .map_err(|reason| HermesError::unsupported_binding(&route, param.name(), reason))?;
                let conversion = match &binding {
                    ParamBinding::Context => Conversion::Passthrough,
                    ParamBinding::Body { content_type } => {
                        let decode = param.body_decode().cloned().ok_or_else(|| {
                            HermesError::unsupported_binding(
                                &route,
                                param.name(),
                                "context parameters cannot bind the body",
                            )
                        })?;
                        Conversion::Body {
                            decoder: registry.decoder_for(content_type),
                            decode,
                        }
                    }
                    ParamBinding::Query { .. }
                    | ParamBinding::Header { .. }
                    | ParamBinding::Cookie { .. }
                    | ParamBinding::RequestParam { .. } => Conversion::Scalar(
                        registry.incoming_for(param.type_id(), param.type_name())?,
                    ),
                };
                signature.push(ParamSignature {
                    name: param.name().to_string(),
                    constraints: param.constraints().to_vec(),
                });
                params.push(BoundParam::new(param.name().to_string(), binding, conversion));
            }

            routes.push(RouteDescriptor {
                verb,
                path,
                signature: MethodSignature {
                    handler,
                    method: method.name,
                    params: signature,
                },
                params,
                request_content_type,
                response_content_type,
                return_type: method.return_type,
                handle: method.handle,
                writer: (method.writer)(registry),
            });
        }
        Ok(routes)
    }
}

impl<H> fmt::Debug for ResourceDef<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDef")
            .field("path", &self.path)
            .field("consumes", &self.consumes)
            .field("produces", &self.produces)
            .field("methods", &self.methods)
            .finish()
    }
}

/// Parses a resource type into its route descriptors.
///
/// Either every routed method parses or the whole type is rejected: an
/// unsupported binding or a parameter type without incoming converter fails
/// the call and no descriptor is returned.
pub fn parse<H: Resource>(registry: &ConverterRegistry) -> HermesResult<Vec<RouteDescriptor>> {
    let mut def = ResourceDef::<H>::new();
    H::describe(&mut def);
    def.into_routes(registry)
}

/// Joins the resource and method paths. A method without its own path is
/// reached under its name. Each present segment gets a leading `/` if it has
/// none; nothing else is normalized.
fn route_path(resource: Option<&str>, method: Option<&str>, method_name: &str) -> String {
    let mut path = String::new();
    if let Some(prefix) = resource {
        push_segment(&mut path, prefix);
    }
    push_segment(&mut path, method.unwrap_or(method_name));
    path
}

fn push_segment(path: &mut String, segment: &str) {
    if !segment.starts_with('/') {
        path.push('/');
    }
    path.push_str(segment);
}

fn qualified<H: Resource>(method: &str) -> String {
    format!("{}::{}", HandlerType::of::<H>().short_name(), method)
}

fn downcast_instance<H: Resource>(instance: Instance) -> HermesResult<Arc<H>> {
    instance.downcast::<H>().map_err(|_| {
        HermesError::instance(type_name::<H>(), "cached instance has a different type")
    })
}
