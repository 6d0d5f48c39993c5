//! Stock [`Renderer`] implementations.

use super::Renderer;

/// No styling; four-space indent and `\n` newlines
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl Renderer for PlainRenderer {}

/// ANSI-coloured terminal output
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleRenderer;

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[91m";
const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[33m";
const BRIGHT_YELLOW: &str = "\x1b[93m";
const CYAN: &str = "\x1b[96m";

fn paint(color: &str, s: &str) -> String {
    format!("{}{}{}", color, s, RESET)
}

impl Renderer for ConsoleRenderer {
    fn id_type(&self, s: &str) -> String {
        paint(RED, s)
    }

    fn id(&self, s: &str) -> String {
        paint(GREEN, s)
    }

    fn type_name(&self, s: &str) -> String {
        paint(YELLOW, s)
    }

    fn num(&self, s: &str) -> String {
        paint(CYAN, s)
    }

    fn string(&self, s: &str) -> String {
        paint(BRIGHT_YELLOW, s)
    }
}

/// HTML fragment output with `<font>` colouring
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn indent(&self) -> &str {
        "&nbsp;&nbsp;&nbsp;&nbsp;"
    }

    fn newline(&self) -> &str {
        "</br>"
    }

    fn id_type(&self, s: &str) -> String {
        format!("<font color='#ff2200'>{}</font>", s)
    }

    fn id(&self, s: &str) -> String {
        format!("<font color='#00ff11'>{}</font>", s)
    }

    fn type_name(&self, s: &str) -> String {
        format!("<font color='#808000'>{}</font>", s)
    }

    fn num(&self, s: &str) -> String {
        format!("<font color='cyan'>{}</font>", s)
    }

    fn string(&self, s: &str) -> String {
        format!("<font color='yellow'>{}</font>", escape_html(s))
    }
}

/// Escape the five HTML-significant characters
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Decoder;
    use crate::render::TreeRenderer;

    #[test]
    fn test_plain_is_identity() {
        assert_eq!(PlainRenderer.num("42"), "42");
        assert_eq!(PlainRenderer.string("<b>"), "<b>");
        assert_eq!(PlainRenderer.indent(), "    ");
        assert_eq!(PlainRenderer.newline(), "\n");
    }

    #[test]
    fn test_console_wraps_in_ansi() {
        assert_eq!(ConsoleRenderer.id("7"), "\x1b[92m7\x1b[0m");
        assert_eq!(ConsoleRenderer.newline(), "\n");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'</a>"#), "&lt;a href=&#34;x&#34;&gt;&amp;&#39;&lt;/a&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_html_tree() {
        // 1: { 2: "<i>" }
        let fields = Decoder::new()
            .decode(&[0x0A, 0x05, 0x12, 0x03, b'<', b'i', b'>'])
            .into_result()
            .unwrap();
        let html = TreeRenderer::new(&HtmlRenderer).render(&fields);

        assert!(html.contains("</br>&nbsp;&nbsp;&nbsp;&nbsp;[<font color='#ff2200'>12</font>]"));
        assert!(html.contains("&lt;i&gt;"));
        assert!(!html.contains("<i>"));
        assert!(html.ends_with("</br>"));
    }
}
