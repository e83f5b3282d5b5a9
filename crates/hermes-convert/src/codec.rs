//! Body codecs for the built-in media types.
//!
//! Decoding goes through serde so any `DeserializeOwned` target works with
//! every media type: JSON bodies through `serde_json`, text bodies through a
//! string deserializer, binary bodies through a byte-sequence deserializer.
//! Encoding first lowers the value to a [`serde_json::Value`].

use crate::sink::ResponseSink;
use hermes_core::{HermesError, HermesResult, MediaKind};
use serde::de::value::{Error as ValueError, SeqDeserializer, StringDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::Serialize;
use serde_json::Value;

/// Decodes a request body into a typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    /// Decoder for a built-in media type.
    Media(MediaKind),
    /// The media type has no codec; every body decodes to an absent value.
    Absent,
}

impl Decoder {
    /// Selects the decoder for a content type.
    #[must_use]
    pub fn for_media(content_type: &str) -> Self {
        MediaKind::from_content_type(content_type).map_or(Self::Absent, Self::Media)
    }

    /// Decodes `body` into `T`.
    ///
    /// A blank JSON body decodes to `None`, as does any body under
    /// [`Decoder::Absent`].
    pub fn decode<T: DeserializeOwned>(&self, body: &[u8]) -> HermesResult<Option<T>> {
        match self {
            Self::Absent => Ok(None),
            Self::Media(MediaKind::Json) => {
                if body.iter().all(u8::is_ascii_whitespace) {
                    return Ok(None);
                }
                serde_json::from_slice(body)
                    .map(Some)
                    .map_err(|e| HermesError::conversion_with_source("invalid JSON body", e))
            }
            Self::Media(MediaKind::PlainText) => {
                let text = std::str::from_utf8(body).map_err(|e| {
                    HermesError::conversion_with_source("text body is not valid UTF-8", e)
                })?;
                let deserializer: StringDeserializer<ValueError> =
                    text.to_owned().into_deserializer();
                T::deserialize(deserializer).map(Some).map_err(|e| {
                    HermesError::conversion_with_source("text body does not fit the parameter", e)
                })
            }
            Self::Media(MediaKind::OctetStream) => {
                let deserializer = SeqDeserializer::<_, ValueError>::new(body.iter().copied());
                T::deserialize(deserializer).map(Some).map_err(|e| {
                    HermesError::conversion_with_source("binary body does not fit the parameter", e)
                })
            }
        }
    }
}

/// Encodes a response value into a [`ResponseSink`] body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoder {
    /// Encoder for a built-in media type.
    Media(MediaKind),
    /// No or unknown media type: the value is written as text.
    Stringify,
}

impl Encoder {
    /// Selects the encoder for a content type.
    #[must_use]
    pub fn for_media(content_type: Option<&str>) -> Self {
        content_type
            .filter(|ct| !ct.is_empty())
            .and_then(MediaKind::from_content_type)
            .map_or(Self::Stringify, Self::Media)
    }

    /// Serializes `value` and writes it to `sink`.
    pub fn encode<T: Serialize + ?Sized>(
        &self,
        value: &T,
        sink: &mut ResponseSink,
    ) -> HermesResult<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| HermesError::conversion_with_source("response value is not serializable", e))?;
        self.encode_value(value, sink)
    }

    /// Writes an already lowered value to `sink`.
    pub fn encode_value(&self, value: Value, sink: &mut ResponseSink) -> HermesResult<()> {
        match self {
            Self::Media(MediaKind::Json) => {
                let value = strip_nulls(value);
                if value.is_null() {
                    return Ok(());
                }
                let bytes = serde_json::to_vec(&value)
                    .map_err(|e| HermesError::conversion_with_source("JSON encoding failed", e))?;
                sink.write(&bytes);
            }
            Self::Media(MediaKind::PlainText) | Self::Stringify => match value {
                Value::String(text) => sink.write(text.as_bytes()),
                other => sink.write(other.to_string().as_bytes()),
            },
            Self::Media(MediaKind::OctetStream) => match value {
                Value::Null => {}
                Value::String(text) => sink.write(text.as_bytes()),
                Value::Array(items) => {
                    let bytes = items
                        .iter()
                        .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                        .collect::<Option<Vec<u8>>>()
                        .ok_or_else(|| {
                            HermesError::conversion("binary response must be a byte sequence")
                        })?;
                    sink.write(&bytes);
                }
                _ => {
                    return Err(HermesError::conversion(
                        "binary response must be a byte sequence",
                    ))
                }
            },
        }
        Ok(())
    }
}

/// Removes `null` members from objects, recursively.
fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}
