//! Decoded field tree.
//!
//! A [`Field`] is built once by the decoder and never mutated. All raw byte
//! ranges are [`Bytes`] slices of the buffer that was decoded, so nested
//! payloads share storage with their parent instead of being copied.

use crate::decoder::WireType;
use bytes::Bytes;

/// A single decoded wire-format field
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    number: u32,
    header: Bytes,
    value: FieldValue,
}

/// Payload of a decoded field, one variant per supported wire type
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Raw varint bit pattern
    Varint(u64),
    /// Raw little-endian 64-bit pattern
    Fixed64(u64),
    /// Length-delimited payload with its resolved interpretation
    LengthDelimited(LengthDelimited),
    /// Raw little-endian 32-bit pattern
    Fixed32(u32),
}

/// How a length-delimited payload was classified
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    /// The payload decoded completely as a message
    Message(Vec<Field>),
    /// The payload is opaque bytes or text
    Leaf,
}

/// A length-delimited payload
#[derive(Debug, Clone, PartialEq)]
pub struct LengthDelimited {
    bytes: Bytes,
    interpretation: Interpretation,
}

impl Field {
    pub(crate) fn new(number: u32, header: Bytes, value: FieldValue) -> Self {
        Self {
            number,
            header,
            value,
        }
    }

    /// Field number from the tag
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Wire type from the tag
    pub fn wire_type(&self) -> WireType {
        self.value.wire_type()
    }

    /// The original tag bytes
    pub fn header_bytes(&self) -> &[u8] {
        &self.header
    }

    /// The decoded payload
    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Type label used in rendered output
    pub fn type_name(&self) -> &'static str {
        match &self.value {
            FieldValue::LengthDelimited(ld) if ld.is_message() => "message",
            other => other.wire_type().as_str(),
        }
    }

    /// Convenience accessor for length-delimited fields
    pub fn as_length_delimited(&self) -> Option<&LengthDelimited> {
        match &self.value {
            FieldValue::LengthDelimited(ld) => Some(ld),
            _ => None,
        }
    }
}

impl FieldValue {
    /// Wire type this payload was decoded from
    pub fn wire_type(&self) -> WireType {
        match self {
            FieldValue::Varint(_) => WireType::Varint,
            FieldValue::Fixed64(_) => WireType::Fixed64,
            FieldValue::LengthDelimited(_) => WireType::LengthDelimited,
            FieldValue::Fixed32(_) => WireType::Fixed32,
        }
    }

    /// Two's complement reading of a varint or fixed64 (`int64`, `sfixed64`)
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            FieldValue::Varint(v) | FieldValue::Fixed64(v) => Some(v as i64),
            _ => None,
        }
    }

    /// Zig-zag reading of a varint (`sint32`, `sint64`)
    pub fn as_sint64(&self) -> Option<i64> {
        match *self {
            FieldValue::Varint(v) => Some(((v >> 1) as i64) ^ -((v & 1) as i64)),
            _ => None,
        }
    }

    /// IEEE 754 reading of a fixed64 (`double`)
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            FieldValue::Fixed64(v) => Some(f64::from_bits(v)),
            _ => None,
        }
    }

    /// Two's complement reading of a fixed32 (`sfixed32`)
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            FieldValue::Fixed32(v) => Some(v as i32),
            _ => None,
        }
    }

    /// IEEE 754 reading of a fixed32 (`float`)
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            FieldValue::Fixed32(v) => Some(f32::from_bits(v)),
            _ => None,
        }
    }
}

impl LengthDelimited {
    pub(crate) fn new(bytes: Bytes, interpretation: Interpretation) -> Self {
        Self {
            bytes,
            interpretation,
        }
    }

    /// Raw payload bytes, retained regardless of interpretation
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Declared (and actual) payload length
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for a zero-length payload
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The resolved interpretation
    pub fn interpretation(&self) -> &Interpretation {
        &self.interpretation
    }

    /// Returns true if the payload was accepted as a nested message
    pub fn is_message(&self) -> bool {
        matches!(self.interpretation, Interpretation::Message(_))
    }

    /// Nested fields, if the payload is a message
    pub fn children(&self) -> Option<&[Field]> {
        match &self.interpretation {
            Interpretation::Message(children) => Some(children),
            Interpretation::Leaf => None,
        }
    }
}
