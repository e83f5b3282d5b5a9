//! # Hermes Core
//!
//! Core types shared by every Hermes crate:
//!
//! - [`HermesError`] - Standard error type and its [`ErrorCategory`]
//! - [`Verb`] and [`MediaKind`] - The closed sets of verbs and body codecs
//! - [`InboundRequest`] - The live request parameters are bound against
//! - [`RequestContext`] - What a context-passthrough parameter receives
//! - [`Args`] - Positional arguments for one invocation
//! - [`ResourceResponse`] - Handler-controlled status, headers and cookies
//! - [`Validator`] - Parameter validation collaborator

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod args;
mod context;
mod error;
mod handler;
pub mod media;
mod request;
mod response;
mod validation;
mod verb;

pub use args::{ArgValue, Args};
pub use context::{RequestContext, RequestId};
pub use error::{BoxError, ErrorCategory, HermesError, HermesResult};
pub use handler::{HandlerType, Instance};
pub use media::MediaKind;
pub use request::{InboundRequest, InboundRequestBuilder};
pub use response::{ResourceResponse, ResourceResponseBuilder, ResponseCookie};
pub use validation::{
    Constraint, ConstraintValidator, MethodSignature, NoopValidator, ParamSignature, Validator,
    Violation,
};
pub use verb::Verb;
