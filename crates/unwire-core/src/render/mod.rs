//! Text rendering of decoded field trees.
//!
//! The tree walk lives in [`TreeRenderer`]; presentation is delegated to a
//! [`Renderer`], a small capability set supplying the indent and newline
//! tokens and a styling hook for each kind of token. Three implementations
//! ship with the crate: [`PlainRenderer`], [`ConsoleRenderer`] and
//! [`HtmlRenderer`].
//!
//! Each field renders as one line:
//!
//! ```text
//! [<tag bytes>] <number> <type>: <value>
//! ```
//!
//! Nested messages continue on the following lines, one indent unit deeper.

mod styles;

use crate::charset::CharsetResolver;
use crate::field::{Field, FieldValue, Interpretation, LengthDelimited};
use std::fmt::Write as FmtWrite;
use tracing::trace;

pub use styles::{ConsoleRenderer, HtmlRenderer, PlainRenderer};

/// Presentation capabilities used by the tree walk.
///
/// Only [`indent`](Renderer::indent) and [`newline`](Renderer::newline)
/// shape the layout; the styling hooks default to returning their input
/// unchanged.
pub trait Renderer {
    /// One level of indentation
    fn indent(&self) -> &str {
        "    "
    }

    /// Line separator
    fn newline(&self) -> &str {
        "\n"
    }

    /// The raw tag bytes, already hex-formatted
    fn id_type(&self, s: &str) -> String {
        s.to_string()
    }

    /// The field number
    fn id(&self, s: &str) -> String {
        s.to_string()
    }

    /// The type label
    fn type_name(&self, s: &str) -> String {
        s.to_string()
    }

    /// A numeric value
    fn num(&self, s: &str) -> String {
        s.to_string()
    }

    /// A text or byte-dump value
    fn string(&self, s: &str) -> String {
        s.to_string()
    }
}

/// Display thresholds for leaf payloads
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Unresolved leaves show at most this many bytes, then ` ...`
    pub leaf_preview_limit: usize,
    /// Text leaves up to this many bytes also show their hex bytes
    pub short_hex_limit: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            leaf_preview_limit: 32,
            short_hex_limit: 8,
        }
    }
}

impl RenderConfig {
    /// Creates a new render config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the byte limit for hex dumps of unresolved leaves
    pub fn leaf_preview_limit(mut self, limit: usize) -> Self {
        self.leaf_preview_limit = limit;
        self
    }

    /// Sets the length up to which text leaves also show hex
    pub fn short_hex_limit(mut self, limit: usize) -> Self {
        self.short_hex_limit = limit;
        self
    }
}

/// Walks a decoded tree and produces text through a [`Renderer`]
#[derive(Debug)]
pub struct TreeRenderer<'r, R: Renderer + ?Sized> {
    renderer: &'r R,
    resolver: CharsetResolver,
    config: RenderConfig,
}

impl<'r, R: Renderer + ?Sized> TreeRenderer<'r, R> {
    /// Creates a tree renderer with the default charset list and thresholds
    pub fn new(renderer: &'r R) -> Self {
        Self {
            renderer,
            resolver: CharsetResolver::default(),
            config: RenderConfig::default(),
        }
    }

    /// Replaces the charset resolver used for leaves
    pub fn with_resolver(mut self, resolver: CharsetResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replaces the display thresholds
    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    /// Renders top-level fields, each followed by a newline token
    pub fn render(&self, fields: &[Field]) -> String {
        let mut output = String::new();
        for field in fields {
            output.push_str(&self.render_field(field, ""));
            output.push_str(self.renderer.newline());
        }
        output
    }

    /// Renders a single field (and its children) at the given indent
    pub fn render_field(&self, field: &Field, indent: &str) -> String {
        let r = self.renderer;
        let mut output = format!(
            "{}[{}] {} {}: ",
            indent,
            r.id_type(&spaced_hex(field.header_bytes())),
            r.id(&field.number().to_string()),
            r.type_name(field.type_name()),
        );

        match field.value() {
            FieldValue::Varint(v) => {
                let _ = write!(
                    output,
                    "{} ({})",
                    r.num(&(*v as i64).to_string()),
                    r.num(&format!("{:#x}", v)),
                );
            }
            FieldValue::Fixed64(v) => {
                let _ = write!(
                    output,
                    "{} ({}) ({})",
                    r.num(&v.to_string()),
                    r.num(&format!("{:#x}", v)),
                    r.num(&format!("{:.6}", f64::from_bits(*v))),
                );
            }
            FieldValue::Fixed32(v) => {
                let _ = write!(
                    output,
                    "{} ({}) ({})",
                    r.num(&(*v as i32).to_string()),
                    r.num(&format!("{:#x}", v)),
                    r.num(&format!("{:.6}", f32::from_bits(*v))),
                );
            }
            FieldValue::LengthDelimited(ld) => {
                let _ = write!(output, "({}): ", ld.len());
                match ld.interpretation() {
                    Interpretation::Message(children) => {
                        if !children.is_empty() {
                            let child_indent = format!("{}{}", indent, r.indent());
                            let lines: Vec<String> = children
                                .iter()
                                .map(|child| self.render_field(child, &child_indent))
                                .collect();
                            output.push_str(r.newline());
                            output.push_str(&lines.join(r.newline()));
                        }
                    }
                    Interpretation::Leaf => output.push_str(&self.render_leaf(ld)),
                }
            }
        }

        output
    }

    fn render_leaf(&self, ld: &LengthDelimited) -> String {
        let r = self.renderer;
        let bytes = ld.bytes();

        match self.resolver.resolve_text(bytes) {
            Ok(resolved) => {
                let mut output = String::new();
                if resolved.charset != "utf8" {
                    let _ = write!(output, "[{}] ", resolved.charset);
                }
                output.push_str(&r.string(&resolved.text));
                if !bytes.is_empty() && bytes.len() <= self.config.short_hex_limit {
                    let _ = write!(output, " ({})", r.string(&spaced_hex(bytes)));
                }
                output
            }
            Err(_) => {
                trace!("No charset matched {} byte leaf, showing hex", bytes.len());
                let limit = self.config.leaf_preview_limit;
                if bytes.len() > limit {
                    format!("{} ...", r.string(&spaced_hex(&bytes[..limit])))
                } else {
                    r.string(&spaced_hex(bytes))
                }
            }
        }
    }
}

impl Field {
    /// Renders this field at `indent` with default charset and thresholds
    pub fn render(&self, indent: &str, renderer: &dyn Renderer) -> String {
        TreeRenderer::new(renderer).render_field(self, indent)
    }
}

/// Lowercase hex, bytes separated by single spaces
fn spaced_hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for (i, byte) in data.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
