//! Document codecs used on the plugin's standard streams.
//!
//! A plugin receives exactly one serialised document on stdin and answers
//! with exactly one document on stdout. The [`Codec`] trait abstracts the
//! format so the same handle logic drives YAML (the reference format) and
//! JSON plugins alike. Types are enforced at the call site through serde:
//! callers encode any [`Serialize`] value and decode into any
//! [`DeserializeOwned`] target.

use std::error::Error as StdError;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Serialisation format spoken over a plugin's standard streams.
///
/// # Example
///
/// ```
/// use plugpipe::codec::CodecFormat;
///
/// let format: CodecFormat = "YAML".parse().expect("format parses");
/// assert_eq!(format, CodecFormat::Yaml);
/// assert_eq!(format.to_string(), "yaml");
/// ```
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CodecFormat {
    /// YAML documents via `serde-saphyr`.
    #[default]
    Yaml,
    /// JSON documents via `serde_json`.
    Json,
}

/// Failure reported by a codec while encoding or decoding a document.
#[derive(Debug, Error)]
#[error("{format}: {source}")]
pub struct CodecError {
    format: CodecFormat,
    #[source]
    source: Box<dyn StdError + Send + Sync>,
}

impl CodecError {
    /// Wraps an underlying serialisation failure.
    pub fn new(format: CodecFormat, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            format,
            source: source.into(),
        }
    }

    /// Format whose encoder or decoder failed.
    #[must_use]
    pub const fn format(&self) -> CodecFormat {
        self.format
    }
}

/// Encode/decode pair for plugin documents.
pub trait Codec {
    /// Format implemented by this codec.
    fn format(&self) -> CodecFormat;

    /// Serialises `value` into a complete document.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] when the value cannot be represented in the
    /// codec's format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Deserialises a complete document.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] when `bytes` are not a well-formed document
    /// of the expected shape.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;

    /// Decodes `bytes` into `target`, leaving it untouched when the stream
    /// holds no document at all.
    ///
    /// Returns `true` when `target` was replaced.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] when a document is present but malformed.
    fn decode_into<T: DeserializeOwned>(
        &self,
        bytes: &[u8],
        target: &mut T,
    ) -> Result<bool, CodecError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(false);
        }
        *target = self.decode(bytes)?;
        Ok(true)
    }
}

/// YAML codec backed by `serde-saphyr`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Yaml;

impl Codec for Yaml {
    fn format(&self) -> CodecFormat {
        CodecFormat::Yaml
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_saphyr::to_string(value)
            .map(String::into_bytes)
            .map_err(|err| CodecError::new(CodecFormat::Yaml, err.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        let text =
            std::str::from_utf8(bytes).map_err(|err| CodecError::new(CodecFormat::Yaml, err))?;
        serde_saphyr::from_str(text)
            .map_err(|err| CodecError::new(CodecFormat::Yaml, err.to_string()))
    }
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Json;

impl Codec for Json {
    fn format(&self) -> CodecFormat {
        CodecFormat::Json
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|err| CodecError::new(CodecFormat::Json, err))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|err| CodecError::new(CodecFormat::Json, err))
    }
}

/// Dispatches to the codec named by the format, for formats chosen at
/// runtime (for example from configuration).
impl Codec for CodecFormat {
    fn format(&self) -> CodecFormat {
        *self
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Yaml => Yaml.encode(value),
            Self::Json => Json.encode(value),
        }
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        match self {
            Self::Yaml => Yaml.decode(bytes),
            Self::Json => Json.decode(bytes),
        }
    }
}
