//! Error types for the unwire-core library.
//!
//! Every structural failure of the wire decoder is a value of [`Error`]. Each
//! variant records the byte offset where the failure was detected; offsets are
//! rebased as errors leave a nested stream, so a top-level caller always sees
//! a position within the buffer it handed in.

use thiserror::Error;

/// Result type alias for unwire operations
pub type Result<T> = std::result::Result<T, Error>;

/// Structural decode failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A varint had no terminating byte within the allowed encoded length
    #[error("malformed varint at offset {offset}")]
    MalformedVarint {
        /// Byte offset where the varint started
        offset: usize,
    },

    /// The field tag could not be decoded as a varint
    #[error("malformed field tag at offset {offset}")]
    MalformedTag {
        /// Byte offset of the tag
        offset: usize,
    },

    /// The tag encodes a field number above 2^29 - 1
    #[error("field number {number} at offset {offset} exceeds {max}", max = crate::MAX_FIELD_NUMBER)]
    FieldNumberOverflow {
        /// Byte offset of the tag
        offset: usize,
        /// The decoded (invalid) field number
        number: u64,
    },

    /// A varint-typed field has no valid varint payload
    #[error("truncated varint payload at offset {offset}")]
    TruncatedVarintPayload {
        /// Byte offset where the payload was expected
        offset: usize,
    },

    /// Fewer than 8 bytes follow a fixed64 tag
    #[error("truncated fixed64 payload at offset {offset}: need 8 bytes, have {available}")]
    TruncatedFixed64 {
        /// Byte offset where the payload was expected
        offset: usize,
        /// Bytes actually available
        available: usize,
    },

    /// The length prefix of a length-delimited field is not a valid varint
    #[error("malformed length prefix at offset {offset}")]
    MalformedLength {
        /// Byte offset of the length prefix
        offset: usize,
    },

    /// The declared length runs past the end of the buffer
    #[error("truncated payload at offset {offset}: declared {declared} bytes, have {available}")]
    TruncatedPayload {
        /// Byte offset where the payload starts
        offset: usize,
        /// Length declared by the prefix
        declared: u64,
        /// Bytes actually available
        available: usize,
    },

    /// Fewer than 4 bytes follow a fixed32 tag
    #[error("truncated fixed32 payload at offset {offset}: need 4 bytes, have {available}")]
    TruncatedFixed32 {
        /// Byte offset where the payload was expected
        offset: usize,
        /// Bytes actually available
        available: usize,
    },

    /// Start/end group wire types (3, 4) are not reconstructed
    #[error("unsupported group encoding (wire type {wire_type}) at offset {offset}")]
    UnsupportedGroupEncoding {
        /// Byte offset of the tag
        offset: usize,
        /// Either 3 or 4
        wire_type: u8,
    },

    /// Wire types 6 and 7 do not exist
    #[error("unknown wire type {wire_type} at offset {offset}")]
    UnknownWireType {
        /// Byte offset of the tag
        offset: usize,
        /// The invalid wire type
        wire_type: u8,
    },

    /// Nested messages went deeper than the configured maximum
    #[error("nesting deeper than {limit} levels at offset {offset}")]
    RecursionLimitExceeded {
        /// Byte offset of the payload that would have exceeded the limit
        offset: usize,
        /// Configured maximum depth
        limit: usize,
    },
}

/// Offset-free classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ErrorKind {
    MalformedVarint,
    MalformedTag,
    FieldNumberOverflow,
    TruncatedVarintPayload,
    TruncatedFixed64,
    MalformedLength,
    TruncatedPayload,
    TruncatedFixed32,
    UnsupportedGroupEncoding,
    UnknownWireType,
    RecursionLimitExceeded,
}

impl Error {
    /// Returns the kind of this error, ignoring offsets and context
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedVarint { .. } => ErrorKind::MalformedVarint,
            Self::MalformedTag { .. } => ErrorKind::MalformedTag,
            Self::FieldNumberOverflow { .. } => ErrorKind::FieldNumberOverflow,
            Self::TruncatedVarintPayload { .. } => ErrorKind::TruncatedVarintPayload,
            Self::TruncatedFixed64 { .. } => ErrorKind::TruncatedFixed64,
            Self::MalformedLength { .. } => ErrorKind::MalformedLength,
            Self::TruncatedPayload { .. } => ErrorKind::TruncatedPayload,
            Self::TruncatedFixed32 { .. } => ErrorKind::TruncatedFixed32,
            Self::UnsupportedGroupEncoding { .. } => ErrorKind::UnsupportedGroupEncoding,
            Self::UnknownWireType { .. } => ErrorKind::UnknownWireType,
            Self::RecursionLimitExceeded { .. } => ErrorKind::RecursionLimitExceeded,
        }
    }

    /// Returns the byte offset at which the failure was detected
    pub fn offset(&self) -> usize {
        match *self {
            Self::MalformedVarint { offset }
            | Self::MalformedTag { offset }
            | Self::FieldNumberOverflow { offset, .. }
            | Self::TruncatedVarintPayload { offset }
            | Self::TruncatedFixed64 { offset, .. }
            | Self::MalformedLength { offset }
            | Self::TruncatedPayload { offset, .. }
            | Self::TruncatedFixed32 { offset, .. }
            | Self::UnsupportedGroupEncoding { offset, .. }
            | Self::UnknownWireType { offset, .. }
            | Self::RecursionLimitExceeded { offset, .. } => offset,
        }
    }

    /// Shifts the recorded offset by `base` bytes.
    ///
    /// Used when an error produced for a sub-slice is reported against the
    /// enclosing buffer.
    pub fn rebase(mut self, base: usize) -> Self {
        match &mut self {
            Self::MalformedVarint { offset }
            | Self::MalformedTag { offset }
            | Self::FieldNumberOverflow { offset, .. }
            | Self::TruncatedVarintPayload { offset }
            | Self::TruncatedFixed64 { offset, .. }
            | Self::MalformedLength { offset }
            | Self::TruncatedPayload { offset, .. }
            | Self::TruncatedFixed32 { offset, .. }
            | Self::UnsupportedGroupEncoding { offset, .. }
            | Self::UnknownWireType { offset, .. }
            | Self::RecursionLimitExceeded { offset, .. } => {
                *offset = offset.saturating_add(base);
            }
        }
        self
    }

    /// Returns true if the ambiguity probe must not swallow this error.
    ///
    /// Every structural failure inside a nested payload is evidence that the
    /// payload is a leaf; exceeding the depth limit is not.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RecursionLimitExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TruncatedFixed64 {
            offset: 3,
            available: 2,
        };
        assert!(err.to_string().contains("fixed64"));
        assert!(err.to_string().contains("offset 3"));

        let err = Error::FieldNumberOverflow {
            offset: 0,
            number: 1 << 40,
        };
        assert!(err.to_string().contains("536870911"));
    }

    #[test]
    fn test_rebase_shifts_offset_only() {
        let err = Error::TruncatedPayload {
            offset: 2,
            declared: 10,
            available: 1,
        }
        .rebase(5);
        assert_eq!(err.offset(), 7);
        assert_eq!(err.kind(), ErrorKind::TruncatedPayload);
        assert!(matches!(err, Error::TruncatedPayload { declared: 10, .. }));
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::RecursionLimitExceeded { offset: 0, limit: 4 }.is_fatal());
        assert!(!Error::MalformedTag { offset: 0 }.is_fatal());
        assert!(!Error::UnsupportedGroupEncoding { offset: 0, wire_type: 3 }.is_fatal());
    }
}
