//! The converter registry.
//!
//! Incoming converters turn a named request value (query, header, cookie)
//! into a typed argument; outgoing writers turn a handler's return value into
//! a response. The registry is populated once during application assembly and
//! shared read-only afterwards.
//!
//! Resolution is asymmetric: a missing incoming converter is a declaration
//! error reported at startup, while outgoing resolution always succeeds by
//! falling back to the codec named by the response content type.

use crate::codec::{Decoder, Encoder};
use crate::sink::ResponseSink;
use hermes_core::{ArgValue, BoxError, HermesError, HermesResult, ResourceResponse};
use serde::Serialize;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

/// A handler's type-erased return value.
pub type Reply = Box<dyn Any + Send>;

/// Converts an optional raw string into a bound argument.
///
/// `None` input always yields `Ok(None)`.
pub type IncomingConverter = Arc<dyn Fn(Option<&str>) -> HermesResult<ArgValue> + Send + Sync>;

/// Writes a handler's return value into the response.
pub type OutgoingWriter = Arc<dyn Fn(Reply, &mut ResponseSink) -> HermesResult<()> + Send + Sync>;

struct IncomingEntry {
    type_name: &'static str,
    convert: IncomingConverter,
}

/// Type-keyed converters plus media codec selection.
///
/// # Example
///
/// ```
/// use hermes_convert::ConverterRegistry;
/// use std::any::TypeId;
///
/// let registry = ConverterRegistry::new();
/// let convert = registry.incoming_for(TypeId::of::<i32>(), "i32").unwrap();
/// let value = convert(Some("10")).unwrap().unwrap();
/// assert_eq!(value.downcast_ref::<i32>(), Some(&10));
/// ```
pub struct ConverterRegistry {
    incoming: HashMap<TypeId, IncomingEntry>,
    outgoing: HashMap<TypeId, OutgoingWriter>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! register_parsed {
    ($registry:expr, trim: $($ty:ty),+) => {
        $( $registry.register_incoming(|raw: &str| raw.trim().parse::<$ty>()); )+
    };
    ($registry:expr, $($ty:ty),+) => {
        $( $registry.register_incoming(|raw: &str| raw.parse::<$ty>()); )+
    };
}

impl ConverterRegistry {
    /// Creates a registry holding the built-in converters.
    ///
    /// Incoming: signed and unsigned integers, `f32`, `f64`, `bool` and
    /// `String`. Outgoing: [`ResourceResponse`].
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        register_parsed!(registry, i8, i16, i32, i64, u8, u16, u32, u64);
        register_parsed!(registry, trim: f32, f64);
        registry.register_incoming(|raw: &str| Ok::<_, Infallible>(raw.eq_ignore_ascii_case("true")));
        registry.register_incoming(|raw: &str| Ok::<_, Infallible>(raw.to_string()));
        registry.register_outgoing(write_resource_response);
        registry
    }

    /// Creates a registry without any converters.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            incoming: HashMap::new(),
            outgoing: HashMap::new(),
        }
    }

    /// Registers the incoming converter for `T`, replacing any previous one.
    pub fn register_incoming<T, E, F>(&mut self, convert: F)
    where
        T: Any + Send + Sync,
        E: Into<BoxError>,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        let target = type_name::<T>();
        let convert: IncomingConverter = Arc::new(move |raw: Option<&str>| {
            let Some(raw) = raw else {
                return Ok(None);
            };
            convert(raw)
                .map(|value| Some(Box::new(value) as Box<dyn Any + Send + Sync>))
                .map_err(|e| {
                    HermesError::conversion_with_source(format!("cannot convert '{raw}' to {target}"), e)
                })
        });
        self.incoming.insert(
            TypeId::of::<T>(),
            IncomingEntry {
                type_name: target,
                convert,
            },
        );
    }

    /// Registers the outgoing writer for `T`, replacing any previous one.
    pub fn register_outgoing<T, F>(&mut self, write: F)
    where
        T: Any + Send,
        F: Fn(T, &mut ResponseSink) -> HermesResult<()> + Send + Sync + 'static,
    {
        let writer: OutgoingWriter = Arc::new(move |reply: Reply, sink: &mut ResponseSink| {
            let value = downcast_reply::<T>(reply)?;
            write(value, sink)
        });
        self.outgoing.insert(TypeId::of::<T>(), writer);
    }

    /// Returns the incoming converter for a type.
    ///
    /// Fails with [`HermesError::UnknownConverter`] if none is registered.
    pub fn incoming_for(&self, type_id: TypeId, type_name: &str) -> HermesResult<IncomingConverter> {
        self.incoming
            .get(&type_id)
            .map(|entry| Arc::clone(&entry.convert))
            .ok_or_else(|| HermesError::unknown_converter(type_name))
    }

    /// Returns `true` if an incoming converter is registered for `T`.
    #[must_use]
    pub fn has_incoming<T: Any>(&self) -> bool {
        self.incoming.contains_key(&TypeId::of::<T>())
    }

    /// Returns the outgoing writer for `T`.
    ///
    /// Without a registered writer the default one is returned: it encodes the
    /// value with the codec of the content type already set on the response,
    /// or as text when there is none.
    #[must_use]
    pub fn outgoing_for<T: Serialize + Any + Send>(&self) -> OutgoingWriter {
        if let Some(writer) = self.outgoing.get(&TypeId::of::<T>()) {
            return Arc::clone(writer);
        }
        Arc::new(|reply: Reply, sink: &mut ResponseSink| {
            let value = downcast_reply::<T>(reply)?;
            let encoder = Encoder::for_media(sink.content_type());
            encoder.encode(&value, sink)
        })
    }

    /// Returns the body decoder for a media type.
    #[must_use]
    pub fn decoder_for(&self, content_type: &str) -> Decoder {
        Decoder::for_media(content_type)
    }

    /// Returns the body encoder for a media type.
    #[must_use]
    pub fn encoder_for(&self, content_type: Option<&str>) -> Encoder {
        Encoder::for_media(content_type)
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut incoming: Vec<_> = self.incoming.values().map(|e| e.type_name).collect();
        incoming.sort_unstable();
        f.debug_struct("ConverterRegistry")
            .field("incoming", &incoming)
            .field("outgoing", &self.outgoing.len())
            .finish()
    }
}

fn downcast_reply<T: Any>(reply: Reply) -> HermesResult<T> {
    reply
        .downcast::<T>()
        .map(|value| *value)
        .map_err(|_| HermesError::conversion(format!("reply is not a {}", type_name::<T>())))
}

fn write_resource_response(response: ResourceResponse, sink: &mut ResponseSink) -> HermesResult<()> {
    sink.set_status(response.status_code_typed());
    if let Some(media_type) = response.media_type() {
        sink.set_content_type(media_type)?;
    }
    if let Some(entity) = response.entity() {
        Encoder::for_media(sink.content_type()).encode_value(entity.clone(), sink)?;
    }
    for (name, value) in response.headers() {
        sink.add_header(name, value)?;
    }
    for cookie in response.cookies() {
        sink.add_header(http::header::SET_COOKIE.as_str(), &cookie.to_header_value())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{header, StatusCode};
    use proptest::prelude::*;

    #[derive(Debug, PartialEq)]
    struct UserId(u32);

    fn convert<T: Any + Clone>(registry: &ConverterRegistry, raw: Option<&str>) -> HermesResult<Option<T>> {
        let converter = registry.incoming_for(TypeId::of::<T>(), type_name::<T>())?;
        Ok(converter(raw)?.map(|value| value.downcast_ref::<T>().cloned().unwrap()))
    }

    #[test]
    fn test_builtin_numbers() {
        let registry = ConverterRegistry::new();
        assert_eq!(convert::<i32>(&registry, Some("10")).unwrap(), Some(10));
        assert_eq!(convert::<i64>(&registry, Some("2017")).unwrap(), Some(2017));
        assert_eq!(convert::<i8>(&registry, Some("-5")).unwrap(), Some(-5));
        assert_eq!(convert::<f64>(&registry, Some(" 51.5 ")).unwrap(), Some(51.5));
        assert_eq!(convert::<f32>(&registry, Some("1")).unwrap(), Some(1.0));
    }

    #[test]
    fn test_builtin_bool_and_string() {
        let registry = ConverterRegistry::new();
        assert_eq!(convert::<bool>(&registry, Some("TRUE")).unwrap(), Some(true));
        assert_eq!(convert::<bool>(&registry, Some("yes")).unwrap(), Some(false));
        assert_eq!(convert::<String>(&registry, Some("Kiev")).unwrap(), Some("Kiev".to_string()));
    }

    #[test]
    fn test_null_input_is_absent() {
        let registry = ConverterRegistry::new();
        assert_eq!(convert::<i32>(&registry, None).unwrap(), None);
        assert_eq!(convert::<String>(&registry, None).unwrap(), None);
    }

    #[test]
    fn test_parse_failure_is_conversion_error() {
        let registry = ConverterRegistry::new();
        let error = convert::<i32>(&registry, Some("ten")).unwrap_err();
        assert!(matches!(error, HermesError::Conversion { .. }));
        assert!(error.to_string().contains("'ten'"));
    }

    #[test]
    fn test_unknown_incoming_converter() {
        let registry = ConverterRegistry::new();
        let error = registry
            .incoming_for(TypeId::of::<UserId>(), "UserId")
            .err()
            .unwrap();
        assert!(matches!(error, HermesError::UnknownConverter { .. }));
        assert!(!registry.has_incoming::<UserId>());
    }

    #[test]
    fn test_register_incoming_overwrites() {
        let mut registry = ConverterRegistry::new();
        registry.register_incoming(|raw: &str| raw.trim_start_matches("u-").parse::<u32>().map(UserId));
        let converter = registry.incoming_for(TypeId::of::<UserId>(), "UserId").unwrap();
        let value = converter(Some("u-42")).unwrap().unwrap();
        assert_eq!(value.downcast_ref::<UserId>(), Some(&UserId(42)));

        registry.register_incoming(|_: &str| Ok::<_, Infallible>(7_i32));
        assert_eq!(convert::<i32>(&registry, Some("10")).unwrap(), Some(7));
    }

    #[test]
    fn test_default_writer_uses_response_content_type() {
        let registry = ConverterRegistry::new();
        let writer = registry.outgoing_for::<Vec<i32>>();

        let mut sink = ResponseSink::new();
        sink.set_content_type("application/json").unwrap();
        writer(Box::new(vec![1, 2]), &mut sink).unwrap();
        assert_eq!(sink.body(), b"[1,2]");

        let mut sink = ResponseSink::new();
        writer(Box::new(vec![3]), &mut sink).unwrap();
        assert_eq!(sink.body(), b"[3]");
    }

    #[test]
    fn test_default_writer_plain_text() {
        let registry = ConverterRegistry::new();
        let writer = registry.outgoing_for::<i32>();
        let mut sink = ResponseSink::new();
        sink.set_content_type("text/plain").unwrap();
        writer(Box::new(1_i32), &mut sink).unwrap();
        assert_eq!(sink.body(), b"1");
        assert_eq!(sink.status(), StatusCode::OK);
    }

    #[test]
    fn test_writer_rejects_wrong_reply_type() {
        let registry = ConverterRegistry::new();
        let writer = registry.outgoing_for::<i32>();
        let mut sink = ResponseSink::new();
        assert!(writer(Box::new("text"), &mut sink).is_err());
    }

    #[test]
    fn test_registered_writer_wins() {
        let mut registry = ConverterRegistry::new();
        registry.register_outgoing(|value: u8, sink: &mut ResponseSink| {
            sink.set_status(StatusCode::ACCEPTED);
            sink.write(&[value]);
            Ok(())
        });
        let writer = registry.outgoing_for::<u8>();
        let mut sink = ResponseSink::new();
        writer(Box::new(9_u8), &mut sink).unwrap();
        assert_eq!(sink.status(), StatusCode::ACCEPTED);
        assert_eq!(sink.body(), &[9]);
    }

    #[test]
    fn test_resource_response_writer() {
        let registry = ConverterRegistry::new();
        let writer = registry.outgoing_for::<ResourceResponse>();
        let response = ResourceResponse::status(StatusCode::CREATED)
            .entity(&serde_json::json!({"city": "Kiev", "country": null}))
            .unwrap()
            .header("x-trace", "abc")
            .cookie("session", "s1")
            .build();

        let mut sink = ResponseSink::new();
        sink.set_content_type("application/json").unwrap();
        writer(Box::new(response), &mut sink).unwrap();

        assert_eq!(sink.status(), StatusCode::CREATED);
        assert_eq!(sink.body(), br#"{"city":"Kiev"}"#);
        assert_eq!(sink.headers()["x-trace"], "abc");
        assert_eq!(sink.headers()[header::SET_COOKIE], "session=s1");
    }

    #[test]
    fn test_resource_response_media_type_overrides() {
        let registry = ConverterRegistry::new();
        let writer = registry.outgoing_for::<ResourceResponse>();
        let response = ResourceResponse::ok()
            .entity("plain")
            .unwrap()
            .media_type("text/plain")
            .build();

        let mut sink = ResponseSink::new();
        sink.set_content_type("application/json").unwrap();
        writer(Box::new(response), &mut sink).unwrap();

        assert_eq!(sink.content_type(), Some("text/plain"));
        assert_eq!(sink.body(), b"plain");
    }

    #[test]
    fn test_resource_response_without_entity() {
        let registry = ConverterRegistry::new();
        let writer = registry.outgoing_for::<ResourceResponse>();
        let mut sink = ResponseSink::new();
        writer(
            Box::new(ResourceResponse::status(StatusCode::BAD_REQUEST).build()),
            &mut sink,
        )
        .unwrap();
        assert_eq!(sink.status(), StatusCode::BAD_REQUEST);
        assert!(sink.body().is_empty());
    }

    proptest! {
        #[test]
        fn prop_integers_convert_exactly(n in any::<i64>()) {
            let registry = ConverterRegistry::new();
            let raw = n.to_string();
            prop_assert_eq!(convert::<i64>(&registry, Some(&raw)).unwrap(), Some(n));
        }

        #[test]
        fn prop_any_string_is_identity(s in ".*") {
            let registry = ConverterRegistry::new();
            prop_assert_eq!(convert::<String>(&registry, Some(&s)).unwrap(), Some(s.clone()));
        }
    }
}
