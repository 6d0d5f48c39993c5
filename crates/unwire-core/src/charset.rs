//! Text detection for leaf payloads.
//!
//! A [`CharsetResolver`] holds an ordered list of [`Charset`] probes and
//! returns the first one that accepts the bytes. The default list holds only
//! the strict [`Utf8`] probe.
//!
//! ## Precision and recall
//!
//! Every extra probe makes more leaves render as text, including leaves that
//! are really binary. Legacy multi-byte encodings accept a large share of
//! arbitrary byte strings, so adding one trades fewer missed strings for more
//! binary blobs shown as garbage text. [`Charset::is_lossy`] flags the probes
//! with that property.

use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// No probe in the resolver accepted the bytes
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unknown charset")]
pub struct UnknownCharset;

/// A single text-decoding probe
pub trait Charset: fmt::Debug + Send + Sync {
    /// Name shown next to text decoded by this probe
    fn name(&self) -> &'static str;

    /// Decode `data`, or return `None` if it is not valid in this charset
    fn decode<'a>(&self, data: &'a [u8]) -> Option<Cow<'a, str>>;

    /// Returns true if this probe accepts many byte strings that are not
    /// really text in its charset
    fn is_lossy(&self) -> bool {
        false
    }
}

/// Strict UTF-8 validation
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8;

impl Charset for Utf8 {
    fn name(&self) -> &'static str {
        "utf8"
    }

    fn decode<'a>(&self, data: &'a [u8]) -> Option<Cow<'a, str>> {
        std::str::from_utf8(data).ok().map(Cow::Borrowed)
    }
}

/// Strict probe over a legacy `encoding_rs` encoding.
///
/// Malformed sequences reject the input instead of being replaced, but these
/// encodings still accept most high-bit byte pairs, so the probe is lossy.
#[cfg(feature = "legacy-charsets")]
#[derive(Debug, Clone, Copy)]
pub struct LegacyCharset {
    encoding: &'static encoding_rs::Encoding,
}

#[cfg(feature = "legacy-charsets")]
impl LegacyCharset {
    /// Wraps any `encoding_rs` encoding
    pub fn new(encoding: &'static encoding_rs::Encoding) -> Self {
        Self { encoding }
    }

    /// Looks up an encoding by WHATWG label (`"gbk"`, `"sjis"`, ...)
    pub fn for_label(label: &str) -> Option<Self> {
        encoding_rs::Encoding::for_label(label.as_bytes()).map(Self::new)
    }

    /// Simplified Chinese
    pub fn gbk() -> Self {
        Self::new(encoding_rs::GBK)
    }

    /// Japanese
    pub fn shift_jis() -> Self {
        Self::new(encoding_rs::SHIFT_JIS)
    }

    /// Traditional Chinese
    pub fn big5() -> Self {
        Self::new(encoding_rs::BIG5)
    }

    /// Korean
    pub fn euc_kr() -> Self {
        Self::new(encoding_rs::EUC_KR)
    }

    /// Western European
    pub fn windows_1252() -> Self {
        Self::new(encoding_rs::WINDOWS_1252)
    }
}

#[cfg(feature = "legacy-charsets")]
impl Charset for LegacyCharset {
    fn name(&self) -> &'static str {
        self.encoding.name()
    }

    fn decode<'a>(&self, data: &'a [u8]) -> Option<Cow<'a, str>> {
        self.encoding
            .decode_without_bom_handling_and_without_replacement(data)
    }

    fn is_lossy(&self) -> bool {
        true
    }
}

/// Text successfully decoded by one of the resolver's probes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedText<'a> {
    /// Decoded text
    pub text: Cow<'a, str>,
    /// Name of the probe that accepted the bytes
    pub charset: &'static str,
}

/// Ordered list of charset probes; first match wins
#[derive(Debug)]
pub struct CharsetResolver {
    probes: Vec<Box<dyn Charset>>,
}

impl Default for CharsetResolver {
    fn default() -> Self {
        Self::new(vec![Box::new(Utf8)])
    }
}

impl CharsetResolver {
    /// Creates a resolver from an explicit probe list
    pub fn new(probes: Vec<Box<dyn Charset>>) -> Self {
        Self { probes }
    }

    /// Appends a probe after the existing ones
    pub fn with_probe(mut self, probe: impl Charset + 'static) -> Self {
        self.probes.push(Box::new(probe));
        self
    }

    /// Names of the registered probes, in order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.probes.iter().map(|p| p.name())
    }

    /// Returns the first successful decode in probe order
    pub fn resolve_text<'a>(&self, data: &'a [u8]) -> Result<ResolvedText<'a>, UnknownCharset> {
        self.probes
            .iter()
            .find_map(|probe| {
                probe.decode(data).map(|text| ResolvedText {
                    text,
                    charset: probe.name(),
                })
            })
            .ok_or(UnknownCharset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct AsciiDigits;

    impl Charset for AsciiDigits {
        fn name(&self) -> &'static str {
            "digits"
        }

        fn decode<'a>(&self, data: &'a [u8]) -> Option<Cow<'a, str>> {
            data.iter()
                .all(u8::is_ascii_digit)
                .then(|| String::from_utf8_lossy(data))
        }
    }

    #[test]
    fn test_default_is_utf8_only() {
        let resolver = CharsetResolver::default();
        assert_eq!(resolver.names().collect::<Vec<_>>(), vec!["utf8"]);

        let resolved = resolver.resolve_text(b"abc").unwrap();
        assert_eq!(resolved.text, "abc");
        assert_eq!(resolved.charset, "utf8");
        assert!(matches!(resolved.text, Cow::Borrowed(_)));

        assert_eq!(
            resolver.resolve_text("你好".as_bytes()).unwrap().text,
            "你好"
        );
        assert_eq!(resolver.resolve_text(&[0xFF, 0xFE]), Err(UnknownCharset));
    }

    #[test]
    fn test_empty_bytes_are_text() {
        assert_eq!(CharsetResolver::default().resolve_text(b"").unwrap().text, "");
    }

    #[test]
    fn test_first_match_wins() {
        let resolver = CharsetResolver::new(vec![Box::new(AsciiDigits), Box::new(Utf8)]);
        assert_eq!(resolver.resolve_text(b"123").unwrap().charset, "digits");
        assert_eq!(resolver.resolve_text(b"12a").unwrap().charset, "utf8");

        let resolver = CharsetResolver::default().with_probe(AsciiDigits);
        assert_eq!(resolver.resolve_text(b"123").unwrap().charset, "utf8");
    }

    #[test]
    fn test_empty_resolver_never_matches() {
        let resolver = CharsetResolver::new(Vec::new());
        assert_eq!(resolver.resolve_text(b"abc"), Err(UnknownCharset));
    }

    #[cfg(feature = "legacy-charsets")]
    #[test]
    fn test_gbk_probe() {
        let resolver = CharsetResolver::default().with_probe(LegacyCharset::gbk());
        // "中文" in GBK is not valid UTF-8
        let resolved = resolver.resolve_text(&[0xD6, 0xD0, 0xCE, 0xC4]).unwrap();
        assert_eq!(resolved.charset, "GBK");
        assert_eq!(resolved.text, "中文");
        assert!(LegacyCharset::gbk().is_lossy());
        assert!(LegacyCharset::for_label("sjis").is_some());
    }
}
