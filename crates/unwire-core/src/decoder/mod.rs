//! Schema-less wire format decoding.
//!
//! ## Algorithm Overview
//!
//! 1. Decode one field at a time from the current offset (tag, then payload)
//! 2. For length-delimited payloads, probe whether the bytes are themselves a
//!    complete message; if not, keep them as a leaf
//! 3. Stop at the end of the buffer, or at the first structural error while
//!    keeping every field decoded before it
//!
//! The probe accepts a payload as a nested message only when it decodes with
//! zero errors and zero leftover bytes. Any other nested failure is swallowed
//! and turns the payload into a leaf, except [`Error::RecursionLimitExceeded`],
//! which always propagates.

mod wire;

use crate::error::{Error, Result};
use crate::field::{Field, FieldValue, Interpretation, LengthDelimited};
use bytes::Bytes;
use tracing::{debug, trace};

pub use wire::{
    decode_tag, decode_varint, read_fixed32, read_fixed64, Tag, WireType, MAX_VARINT_LEN,
};

/// Default maximum nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Configuration for the decoder
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Maximum nesting depth before decoding fails with
    /// [`Error::RecursionLimitExceeded`]
    pub max_depth: usize,
    /// Payloads shorter than this are kept as leaves without probing
    pub min_nested_len: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            min_nested_len: 0,
        }
    }
}

impl DecoderConfig {
    /// Creates a new decoder config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum nesting depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the minimum payload length for nested-message probing
    pub fn min_nested_len(mut self, len: usize) -> Self {
        self.min_nested_len = len;
        self
    }
}

/// Result of decoding a stream of fields.
///
/// Decoding stops at the first structural error; the fields decoded before
/// it are kept alongside the error.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutcome {
    fields: Vec<Field>,
    error: Option<Error>,
}

impl DecodeOutcome {
    /// Fields decoded before the end of input or the first error
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The error that stopped decoding, if any
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Returns true if the whole buffer decoded without error
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Splits into the decoded prefix and the stopping error
    pub fn into_parts(self) -> (Vec<Field>, Option<Error>) {
        (self.fields, self.error)
    }

    /// Discards the partial result on error
    pub fn into_result(self) -> Result<Vec<Field>> {
        match self.error {
            None => Ok(self.fields),
            Some(e) => Err(e),
        }
    }
}

/// Schema-less protobuf decoder
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Creates a new decoder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new decoder with custom configuration
    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decodes a whole buffer as a sequence of fields
    pub fn decode(&self, data: &[u8]) -> DecodeOutcome {
        self.decode_bytes(Bytes::copy_from_slice(data))
    }

    /// Decodes a whole buffer without copying it
    pub fn decode_bytes(&self, data: Bytes) -> DecodeOutcome {
        debug!("Decoding {} bytes", data.len());
        let outcome = self.decode_stream(&data, 0);
        match &outcome.error {
            None => debug!("Decoded {} top-level fields", outcome.fields.len()),
            Some(e) => debug!(
                "Decoding stopped after {} top-level fields: {}",
                outcome.fields.len(),
                e
            ),
        }
        outcome
    }

    /// Decodes the single field at the start of `data`.
    ///
    /// Returns the field and the number of bytes it occupies.
    pub fn decode_field(&self, data: &[u8]) -> Result<(Field, usize)> {
        self.field_at(&Bytes::copy_from_slice(data), 0)
    }

    fn decode_stream(&self, data: &Bytes, depth: usize) -> DecodeOutcome {
        let mut fields = Vec::new();
        let mut position = 0;

        while position < data.len() {
            match self.field_at(&data.slice(position..), depth) {
                Ok((field, len)) => {
                    trace!(
                        "Field {} ({}) at offset {}, {} bytes",
                        field.number(),
                        field.wire_type(),
                        position,
                        len
                    );
                    fields.push(field);
                    position += len;
                }
                Err(e) => {
                    return DecodeOutcome {
                        fields,
                        error: Some(e.rebase(position)),
                    };
                }
            }
        }

        DecodeOutcome {
            fields,
            error: None,
        }
    }

    fn field_at(&self, data: &Bytes, depth: usize) -> Result<(Field, usize)> {
        let tag = decode_tag(data)?;
        let header = data.slice(..tag.len);
        let payload = &data[tag.len..];

        let (value, value_len) = match tag.wire_type {
            WireType::Varint => {
                let (value, len) = decode_varint(payload).map_err(|_| {
                    Error::TruncatedVarintPayload { offset: tag.len }
                })?;
                (FieldValue::Varint(value), len)
            }
            WireType::Fixed64 => {
                let value = read_fixed64(payload).ok_or(Error::TruncatedFixed64 {
                    offset: tag.len,
                    available: payload.len(),
                })?;
                (FieldValue::Fixed64(value), 8)
            }
            WireType::LengthDelimited => {
                let (declared, prefix_len) = decode_varint(payload)
                    .map_err(|_| Error::MalformedLength { offset: tag.len })?;

                let start = tag.len + prefix_len;
                let available = data.len() - start;
                let len = usize::try_from(declared)
                    .ok()
                    .filter(|&len| len <= available)
                    .ok_or(Error::TruncatedPayload {
                        offset: start,
                        declared,
                        available,
                    })?;

                let bytes = data.slice(start..start + len);
                let interpretation = self
                    .probe_message(&bytes, depth)
                    .map_err(|e| e.rebase(start))?;

                (
                    FieldValue::LengthDelimited(LengthDelimited::new(bytes, interpretation)),
                    prefix_len + len,
                )
            }
            WireType::StartGroup | WireType::EndGroup => {
                return Err(Error::UnsupportedGroupEncoding {
                    offset: 0,
                    wire_type: tag.wire_type as u8,
                });
            }
            WireType::Fixed32 => {
                let value = read_fixed32(payload).ok_or(Error::TruncatedFixed32 {
                    offset: tag.len,
                    available: payload.len(),
                })?;
                (FieldValue::Fixed32(value), 4)
            }
        };

        Ok((Field::new(tag.field_number, header, value), tag.len + value_len))
    }

    /// Decides whether a length-delimited payload is a nested message.
    ///
    /// Pure and deterministic: the same bytes at the same depth always yield
    /// the same interpretation. Only a fatal error escapes.
    fn probe_message(&self, bytes: &Bytes, depth: usize) -> Result<Interpretation> {
        if bytes.len() < self.config.min_nested_len {
            return Ok(Interpretation::Leaf);
        }

        if depth >= self.config.max_depth {
            return Err(Error::RecursionLimitExceeded {
                offset: 0,
                limit: self.config.max_depth,
            });
        }

        let (children, error) = self.decode_stream(bytes, depth + 1).into_parts();
        match error {
            None => Ok(Interpretation::Message(children)),
            Some(e) if e.is_fatal() => Err(e),
            Some(e) => {
                trace!("Payload of {} bytes kept as leaf: {}", bytes.len(), e);
                Ok(Interpretation::Leaf)
            }
        }
    }
}
