//! # Hermes Convert
//!
//! Converters between wire values and typed handler arguments and results.
//!
//! | Direction | Keyed by | Missing entry |
//! |-----------|----------|---------------|
//! | Incoming scalar (query, header, cookie) | target type | [`HermesError::UnknownConverter`](hermes_core::HermesError) |
//! | Incoming body | media type | decodes to an absent value |
//! | Outgoing result | source type | default writer using the response content type |
//! | Outgoing body | media type | written as text |
//!
//! ## Example
//!
//! ```rust
//! use hermes_convert::{ConverterRegistry, ResponseSink};
//!
//! let mut registry = ConverterRegistry::new();
//! registry.register_incoming(|raw: &str| raw.parse::<std::net::IpAddr>());
//!
//! let writer = registry.outgoing_for::<Vec<String>>();
//! let mut sink = ResponseSink::new();
//! sink.set_content_type("application/json").unwrap();
//! writer(Box::new(vec!["a".to_string()]), &mut sink).unwrap();
//! assert_eq!(sink.body(), br#"["a"]"#);
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-convert/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod codec;
mod registry;
mod sink;

pub use codec::{Decoder, Encoder};
pub use registry::{ConverterRegistry, IncomingConverter, OutgoingWriter, Reply};
pub use sink::ResponseSink;
