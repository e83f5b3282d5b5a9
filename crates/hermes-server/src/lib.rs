//! # Hermes Server
//!
//! Request dispatch and the HTTP transport for Hermes.
//!
//! - [`Dispatcher`]: maps a buffered request onto a route, binds and
//!   validates arguments, invokes the handler and buffers the response
//! - [`Server`]: HTTP/1.1 over Hyper, with body limits and graceful shutdown
//!
//! The dispatcher does not depend on the transport; `hermes-test` drives it
//! in memory.
//!
//! ## Example
//!
//! ```rust,ignore
//! use hermes_server::{Dispatcher, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::new(table).with_matching_url("/resources/*");
//!     Server::new(ServerConfig::default(), dispatcher).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod dispatcher;
pub mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use dispatcher::{mount_prefix, DispatchResponse, Dispatcher, DEFAULT_MATCHING_URL};
pub use server::{HttpResponse, ResponseBody, Server, ServerError};
pub use shutdown::{ConnectionGuard, ConnectionTracker, ShutdownSignal};
