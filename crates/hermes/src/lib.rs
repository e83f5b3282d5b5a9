//! # Hermes
//!
//! Declare REST resources as plain Rust types and serve them over HTTP.
//!
//! A resource describes its methods once: verb, path, media types and how
//! each parameter is bound (query, header, cookie, body or the request
//! context). Hermes turns those descriptions into a route table, converts
//! request text into typed arguments, validates them, invokes the method and
//! writes its result.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hermes::prelude::*;
//!
//! #[derive(Default)]
//! struct Greeter;
//!
//! impl Greeter {
//!     fn hello(&self, mut args: Args) -> Result<String, BoxError> {
//!         let name: String = args.required(0)?;
//!         Ok(format!("hello {name}"))
//!     }
//! }
//!
//! impl Resource for Greeter {
//!     fn describe(def: &mut ResourceDef<Self>) {
//!         def.path("/greet");
//!         def.method("hello", Self::hello)
//!             .get()
//!             .param(Param::of::<String>("name").query("name").not_empty("name is required"));
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     Application::builder()
//!         .with_port(8080)
//!         .with_matching_url("/resources/*")
//!         .with_service::<Greeter>()
//!         .build(Constructors::new().with_default::<Greeter>())?
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Crates
//!
//! | Crate | Contents |
//! |-------|----------|
//! | [`core`] | errors, verbs, media types, request view, arguments, validation |
//! | [`convert`] | incoming converters, outgoing writers, body codecs |
//! | [`router`] | resource declarations, route descriptors, instance cache |
//! | [`server`] | dispatcher and HTTP transport |
//! | [`config`] | typed configuration and its loader |
//! | [`telemetry`] | logging setup |

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod application;

pub use application::{Application, ApplicationBuilder, ApplicationError, ApplicationHandle};

pub use hermes_config as config;
pub use hermes_convert as convert;
pub use hermes_core as core;
pub use hermes_router as router;
pub use hermes_server as server;
pub use hermes_telemetry as telemetry;
pub use http;

/// Common imports for writing resources and assembling applications.
///
/// ```rust,ignore
/// use hermes::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Application, ApplicationBuilder, ApplicationError, ApplicationHandle};

    pub use hermes_config::{ApplicationConfig, ConfigLoader};
    pub use hermes_convert::{ConverterRegistry, ResponseSink};
    pub use hermes_core::media::{APPLICATION_JSON, APPLICATION_OCTET_STREAM, TEXT_PLAIN};
    pub use hermes_core::{
        Args, BoxError, HermesError, HermesResult, Instance, MethodSignature, RequestContext,
        ResourceResponse, Validator, Verb, Violation,
    };
    pub use hermes_router::{Constructors, Param, Resource, ResourceDef};
    pub use hermes_telemetry::{init_logging, LogConfig};
    pub use http::StatusCode;
}
