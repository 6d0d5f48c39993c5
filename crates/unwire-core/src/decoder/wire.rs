//! Low-level protobuf wire format primitives.
//!
//! ## Wire Format Overview
//!
//! Each protobuf field is encoded as:
//! - A varint "tag" containing the field number and wire type
//! - The field data (format depends on wire type)
//!
//! Wire types:
//! - 0: VARINT (int32, int64, uint32, uint64, sint32, sint64, bool, enum)
//! - 1: I64 (fixed64, sfixed64, double)
//! - 2: LEN (string, bytes, embedded messages, packed repeated fields)
//! - 3, 4: start/end group (deprecated, rejected)
//! - 5: I32 (fixed32, sfixed32, float)

use crate::error::{Error, Result};
use crate::MAX_FIELD_NUMBER;
use std::fmt;

/// Upper bound on the encoded length of a single varint.
///
/// A 64-bit value needs at most 10 bytes; anything still continuing after
/// 16 bytes is treated as corruption.
pub const MAX_VARINT_LEN: usize = 16;

/// Protobuf wire types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Variable-length integer
    Varint = 0,
    /// 64-bit fixed-width
    Fixed64 = 1,
    /// Length-delimited (strings, bytes, embedded messages)
    LengthDelimited = 2,
    /// Start group (deprecated)
    StartGroup = 3,
    /// End group (deprecated)
    EndGroup = 4,
    /// 32-bit fixed-width
    Fixed32 = 5,
}

impl WireType {
    /// Short name used when rendering a field header
    pub fn as_str(&self) -> &'static str {
        match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "fixed64/double",
            WireType::LengthDelimited => "string",
            WireType::StartGroup => "group-start",
            WireType::EndGroup => "group-end",
            WireType::Fixed32 => "fixed32/float",
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for WireType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::Fixed32),
            _ => Err(Error::UnknownWireType {
                offset: 0,
                wire_type: value,
            }),
        }
    }
}

/// Decode a varint from the given bytes.
///
/// Returns the decoded value and the number of bytes consumed. Bits beyond
/// the 64th are discarded; a varint that has not terminated after
/// [`MAX_VARINT_LEN`] bytes, or that runs off the end of `data`, is an error.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0u32;

    for (i, &byte) in data.iter().take(MAX_VARINT_LEN).enumerate() {
        if shift < u64::BITS {
            result |= u64::from(byte & 0x7F) << shift;
        }
        shift += 7;

        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    Err(Error::MalformedVarint { offset: 0 })
}

/// A decoded field tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    /// Field number (`tag >> 3`)
    pub field_number: u32,
    /// Wire type (`tag & 7`)
    pub wire_type: WireType,
    /// Encoded length of the tag varint
    pub len: usize,
}

/// Decode the tag at the start of `data`.
///
/// The field number is checked before the wire type, so a tag that is
/// invalid on both counts reports [`Error::FieldNumberOverflow`].
pub fn decode_tag(data: &[u8]) -> Result<Tag> {
    let (raw, len) = decode_varint(data).map_err(|_| Error::MalformedTag { offset: 0 })?;

    let number = raw >> 3;
    if number > u64::from(MAX_FIELD_NUMBER) {
        return Err(Error::FieldNumberOverflow { offset: 0, number });
    }

    let wire_type = WireType::try_from((raw & 0x07) as u8)?;

    Ok(Tag {
        field_number: number as u32,
        wire_type,
        len,
    })
}

/// Read a little-endian `u64` from the first 8 bytes of `data`
pub fn read_fixed64(data: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = data.get(..8)?.try_into().ok()?;
    Some(u64::from_le_bytes(bytes))
}

/// Read a little-endian `u32` from the first 4 bytes of `data`
pub fn read_fixed32(data: &[u8]) -> Option<u32> {
    let bytes: [u8; 4] = data.get(..4)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn test_decode_varint_single_byte() {
        let data = [0x08]; // Value 8
        let (value, len) = decode_varint(&data).unwrap();
        assert_eq!(value, 8);
        assert_eq!(len, 1);
    }

    #[test]
    fn test_decode_varint_multi_byte() {
        let data = [0xAC, 0x02]; // Value 300
        let (value, len) = decode_varint(&data).unwrap();
        assert_eq!(value, 300);
        assert_eq!(len, 2);
    }

    #[test]
    fn test_decode_varint_max() {
        // Maximum 64-bit varint (all 1s)
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        let (value, len) = decode_varint(&data).unwrap();
        assert_eq!(value, u64::MAX);
        assert_eq!(len, 10);
    }

    #[test]
    fn test_decode_varint_overlong_within_bound() {
        // 15 continuation bytes then a terminator: accepted, high bits dropped
        let mut data = vec![0x81];
        data.extend([0x80; 14]);
        data.push(0x00);
        assert_eq!(data.len(), MAX_VARINT_LEN);
        assert_eq!(decode_varint(&data).unwrap(), (1, MAX_VARINT_LEN));
    }

    #[test]
    fn test_decode_varint_exceeds_bound() {
        let mut data = vec![0x80; MAX_VARINT_LEN];
        data.push(0x01);
        let err = decode_varint(&data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedVarint);
    }

    #[test]
    fn test_decode_varint_empty_and_unterminated() {
        assert!(decode_varint(&[]).is_err());
        assert!(decode_varint(&[0x80]).is_err());
        assert!(decode_varint(&[0xAC, 0x82]).is_err());
    }

    #[test]
    fn test_wire_type_conversion() {
        assert_eq!(WireType::try_from(0).unwrap(), WireType::Varint);
        assert_eq!(WireType::try_from(1).unwrap(), WireType::Fixed64);
        assert_eq!(WireType::try_from(2).unwrap(), WireType::LengthDelimited);
        assert_eq!(WireType::try_from(5).unwrap(), WireType::Fixed32);
        assert_eq!(
            WireType::try_from(6).unwrap_err().kind(),
            ErrorKind::UnknownWireType
        );
    }

    #[test]
    fn test_decode_tag() {
        let tag = decode_tag(&[0x12]).unwrap();
        assert_eq!(tag.field_number, 2);
        assert_eq!(tag.wire_type, WireType::LengthDelimited);
        assert_eq!(tag.len, 1);

        // Field 0 is representable on the wire and accepted here
        assert_eq!(decode_tag(&[0x00]).unwrap().field_number, 0);
    }

    #[test]
    fn test_decode_tag_max_field_number() {
        let mut data = Vec::new();
        prost::encoding::encode_varint(u64::from(MAX_FIELD_NUMBER) << 3, &mut data);
        assert_eq!(decode_tag(&data).unwrap().field_number, MAX_FIELD_NUMBER);

        data.clear();
        prost::encoding::encode_varint((u64::from(MAX_FIELD_NUMBER) + 1) << 3, &mut data);
        assert_eq!(
            decode_tag(&data).unwrap_err().kind(),
            ErrorKind::FieldNumberOverflow
        );
    }

    #[test]
    fn test_decode_tag_malformed() {
        assert_eq!(decode_tag(&[]).unwrap_err().kind(), ErrorKind::MalformedTag);
        assert_eq!(
            decode_tag(&[0xFF; 17]).unwrap_err().kind(),
            ErrorKind::MalformedTag
        );
    }

    #[test]
    fn test_read_fixed() {
        assert_eq!(read_fixed32(&[0x01, 0x00, 0x00, 0x00, 0xFF]), Some(1));
        assert_eq!(read_fixed32(&[0x01, 0x00, 0x00]), None);
        assert_eq!(read_fixed64(&[0xFF; 8]), Some(u64::MAX));
        assert_eq!(read_fixed64(&[0xFF; 7]), None);
    }

    proptest! {
        #[test]
        fn varint_round_trips_through_prost_encoding(value in any::<u64>()) {
            let mut encoded = Vec::new();
            prost::encoding::encode_varint(value, &mut encoded);
            prop_assert_eq!(decode_varint(&encoded).unwrap(), (value, encoded.len()));
        }
    }
}
