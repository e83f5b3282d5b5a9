//! Route descriptors.
//!
//! A [`RouteDescriptor`] is the unit of dispatch: everything needed to turn a
//! request into handler arguments, invoke the handler and write its result.
//! Descriptors are immutable once parsed and shared between requests.

use crate::binding::{BodyDecode, ParamBinding};
use hermes_convert::{Decoder, IncomingConverter, OutgoingWriter, Reply, ResponseSink};
use hermes_core::{
    ArgValue, Args, HandlerType, HermesResult, InboundRequest, Instance, MethodSignature,
    RequestContext, Verb,
};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed, sendable future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Invokes a handler method on an instance with bound arguments.
///
/// The returned future does all the work, including for synchronous handlers,
/// so callers may move it onto another task.
pub type MethodHandle = Arc<dyn Fn(Instance, Args) -> BoxFuture<HermesResult<Reply>> + Send + Sync>;

/// How a bound parameter's raw value becomes an argument.
#[derive(Clone)]
pub(crate) enum Conversion {
    /// The request context is handed over as is.
    Passthrough,
    /// A named raw value goes through an incoming converter.
    Scalar(IncomingConverter),
    /// The body is decoded by media type.
    Body {
        decoder: Decoder,
        decode: BodyDecode,
    },
}

/// A parameter with its resolved binding and conversion.
#[derive(Clone)]
pub struct BoundParam {
    name: String,
    binding: ParamBinding,
    conversion: Conversion,
}

impl BoundParam {
    pub(crate) fn new(name: String, binding: ParamBinding, conversion: Conversion) -> Self {
        Self {
            name,
            binding,
            conversion,
        }
    }

    /// Returns the declared parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the binding.
    #[must_use]
    pub fn binding(&self) -> &ParamBinding {
        &self.binding
    }

    /// Produces this parameter's argument for a request.
    pub fn extract(&self, request: &InboundRequest, context: &RequestContext) -> HermesResult<ArgValue> {
        match &self.conversion {
            Conversion::Passthrough => Ok(Some(Box::new(context.clone()))),
            Conversion::Scalar(convert) => convert(self.binding.lookup(request)),
            Conversion::Body { decoder, decode } => decode(*decoder, request.body()),
        }
    }
}

impl fmt::Debug for BoundParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundParam")
            .field("name", &self.name)
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

/// Everything needed to dispatch one `(verb, path)` pair.
#[derive(Clone)]
pub struct RouteDescriptor {
    pub(crate) verb: Verb,
    pub(crate) path: String,
    pub(crate) signature: MethodSignature,
    pub(crate) params: Vec<BoundParam>,
    pub(crate) request_content_type: String,
    pub(crate) response_content_type: String,
    pub(crate) return_type: &'static str,
    pub(crate) handle: MethodHandle,
    pub(crate) writer: OutgoingWriter,
}

impl RouteDescriptor {
    /// Returns the verb.
    #[must_use]
    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Returns the full route path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the type declaring the handler method.
    #[must_use]
    pub fn handler_type(&self) -> &HandlerType {
        &self.signature.handler
    }

    /// Returns the handler method name.
    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.signature.method
    }

    /// Returns the signature consulted by validators.
    #[must_use]
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[BoundParam] {
        &self.params
    }

    /// Returns the content type request bodies are decoded with.
    #[must_use]
    pub fn request_content_type(&self) -> &str {
        &self.request_content_type
    }

    /// Returns the content type set on responses.
    #[must_use]
    pub fn response_content_type(&self) -> &str {
        &self.response_content_type
    }

    /// Returns the name of the handler's return type.
    #[must_use]
    pub fn return_type(&self) -> &'static str {
        self.return_type
    }

    /// Binds every parameter for a request, in declaration order.
    pub fn bind(&self, request: &InboundRequest, context: &RequestContext) -> HermesResult<Args> {
        let mut args = Args::with_capacity(self.params.len());
        for param in &self.params {
            args.push(param.extract(request, context)?);
        }
        Ok(args)
    }

    /// Invokes the handler method.
    pub fn invoke(&self, instance: Instance, args: Args) -> BoxFuture<HermesResult<Reply>> {
        (self.handle)(instance, args)
    }

    /// Writes a handler's return value with the pre-bound writer.
    pub fn write(&self, reply: Reply, sink: &mut ResponseSink) -> HermesResult<()> {
        (self.writer)(reply, sink)
    }
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("verb", &self.verb)
            .field("path", &self.path)
            .field("method", &self.signature.qualified_name())
            .field("params", &self.params)
            .field("request_content_type", &self.request_content_type)
            .field("response_content_type", &self.response_content_type)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}
