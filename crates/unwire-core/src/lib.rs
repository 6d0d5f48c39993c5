//! # unwire-core
//!
//! A library for decoding Protocol Buffer messages without a schema.
//!
//! Given bytes that are suspected to be a protobuf message, the decoder
//! recovers every field it can: field number, wire type and raw value, and
//! for length-delimited fields either a recursively decoded sub-message or a
//! text/byte leaf.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`decoder`]: Varint codec, field and stream decoding, nested-message probe
//! - [`field`]: The immutable decoded tree
//! - [`charset`]: Text detection for leaf payloads
//! - [`render`]: Tree-to-text rendering through a pluggable [`Renderer`]
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```
//! use unwire_core::{decode, render, PlainRenderer};
//!
//! let outcome = decode(&[0x08, 0x96, 0x01, 0x12, 0x03, b'a', b'b', b'c']);
//! assert!(outcome.is_complete());
//!
//! let text = render(outcome.fields(), &PlainRenderer);
//! assert_eq!(text, "[08] 1 varint: 150 (0x96)\n[12] 2 string: (3): abc (61 62 63)\n");
//! ```
//!
//! Decoding stops at the first structural error but keeps everything decoded
//! before it, so diagnostic callers can show both:
//!
//! ```
//! use unwire_core::{decode, ErrorKind};
//!
//! let outcome = decode(&[0x08, 0x01, 0x09, 0x00]);
//! assert_eq!(outcome.fields().len(), 1);
//! assert_eq!(outcome.error().map(|e| e.kind()), Some(ErrorKind::TruncatedFixed64));
//! ```
//!
//! ## Extensibility
//!
//! - [`Renderer`]: Customize how the decoded tree is presented
//! - [`Charset`]: Add text-decoding probes for leaf payloads
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod charset;
pub mod decoder;
pub mod error;
pub mod field;
pub mod render;

// Re-export primary types for convenience
pub use charset::{Charset, CharsetResolver, ResolvedText, UnknownCharset, Utf8};
pub use decoder::{DecodeOutcome, Decoder, DecoderConfig, WireType};
pub use error::{Error, ErrorKind, Result};
pub use field::{Field, FieldValue, Interpretation, LengthDelimited};
pub use render::{
    ConsoleRenderer, HtmlRenderer, PlainRenderer, RenderConfig, Renderer, TreeRenderer,
};

#[cfg(feature = "legacy-charsets")]
pub use charset::LegacyCharset;

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum valid protobuf field number (2^29 - 1)
pub const MAX_FIELD_NUMBER: u32 = 536_870_911;

/// Decodes `data` with the default configuration
pub fn decode(data: &[u8]) -> DecodeOutcome {
    Decoder::new().decode(data)
}

/// Decodes the single field at the start of `data`
pub fn decode_field(data: &[u8]) -> Result<(Field, usize)> {
    Decoder::new().decode_field(data)
}

/// Renders decoded fields through `renderer` with default settings
pub fn render(fields: &[Field], renderer: &dyn Renderer) -> String {
    TreeRenderer::new(renderer).render(fields)
}

/// Decodes and renders `data` as plain text, propagating decode errors
pub fn try_dump(data: &[u8]) -> Result<String> {
    try_dump_with(data, &PlainRenderer)
}

/// Decodes and renders `data` through `renderer`, propagating decode errors
pub fn try_dump_with(data: &[u8], renderer: &dyn Renderer) -> Result<String> {
    let fields = decode(data).into_result()?;
    Ok(render(&fields, renderer))
}

/// Decodes and renders `data` as plain text.
///
/// Any structural error yields an empty string; use [`decode`] to see the
/// error and the partial tree.
pub fn dump(data: &[u8]) -> String {
    try_dump(data).unwrap_or_default()
}
