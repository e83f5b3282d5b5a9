//! Resource declarations and the route table for Hermes.
//!
//! Handler types implement [`Resource`] and describe their methods on a
//! [`ResourceDef`]. Registration parses each type into [`RouteDescriptor`]s
//! and stores them in a [`RouteTable`] keyed by `(verb, path)`.
//!
//! # Features
//!
//! - **Declaration tables**: paths, verbs, content types and parameter
//!   sources are declared next to the handler methods
//! - **Exact matching**: one hash lookup per request, partitioned by verb
//! - **Startup validation**: unsupported bindings and unconvertible parameter
//!   types reject the whole handler type before the server starts
//! - **Lazy instances**: handler objects are built once, on first use
//!
//! # Example
//!
//! ```rust
//! use hermes_convert::ConverterRegistry;
//! use hermes_core::{Args, BoxError, Verb};
//! use hermes_router::{Constructors, Param, Resource, ResourceDef, RouteTable};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct RunService;
//!
//! impl RunService {
//!     fn pace(&self, mut args: Args) -> Result<String, BoxError> {
//!         let pace: i32 = args.required(0)?;
//!         Ok(format!("{pace} min/km"))
//!     }
//! }
//!
//! impl Resource for RunService {
//!     fn describe(def: &mut ResourceDef<Self>) {
//!         def.path("/run");
//!         def.method("pace", Self::pace)
//!             .get()
//!             .path("/pace")
//!             .param(Param::of::<i32>("pace").query("pace").default_value("5"));
//!     }
//! }
//!
//! let factory = Constructors::new().with_default::<RunService>();
//! let mut table = RouteTable::new(Arc::new(ConverterRegistry::new()), Arc::new(factory));
//! table.add_handler_type::<RunService>().unwrap();
//!
//! let route = table.lookup(Verb::Get, "/run/pace").unwrap();
//! assert_eq!(route.method_name(), "pace");
//! ```
//!
//! # Parameter sources
//!
//! Markers are checked in a fixed order and the first present one wins:
//!
//! | Order | Marker | Binding |
//! |-------|--------|---------|
//! | 1 | context | the [`hermes_core::RequestContext`] |
//! | 2 | query | named query parameter |
//! | 3 | header | named header |
//! | 4 | cookie | named cookie |
//! | 5 | path | rejected at registration |
//! | 6 | form | rejected at registration |
//! | 7 | none, `GET` | request parameter under the declared name |
//! | 7 | none, `POST` | whole body, decoded by request content type |

#![doc(html_root_url = "https://docs.rs/hermes-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binding;
mod descriptor;
mod instances;
mod resource;
mod table;

pub use binding::{Param, ParamBinding};
pub use descriptor::{BoundParam, BoxFuture, MethodHandle, RouteDescriptor};
pub use instances::{Constructors, InstanceCache, InstanceFactory};
pub use resource::{parse, MethodDecl, Resource, ResourceDef};
pub use table::{RouteTable, VerbRoutes};
