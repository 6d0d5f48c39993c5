//! unwire - Dump Protocol Buffer messages without a schema
//!
//! This tool reads a suspected protobuf message (hex, base64, raw bytes or an
//! xxd dump, optionally zlib-compressed), decodes it without any `.proto`
//! definition and prints the recovered field tree.

use anyhow::{Context, Result};
use base64::Engine;
use clap::{Args, Parser, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, trace, Level};
use tracing_subscriber::EnvFilter;
use unwire_core::decoder::DEFAULT_MAX_DEPTH;
use unwire_core::{
    CharsetResolver, ConsoleRenderer, Decoder, DecoderConfig, HtmlRenderer, PlainRenderer,
    RenderConfig, Renderer, TreeRenderer,
};

/// Dump Protocol Buffer messages without a schema
#[derive(Parser, Debug)]
#[command(name = "unwire")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Encoded message; read from stdin when neither this nor --file is given
    #[arg(conflicts_with = "file")]
    input: Option<String>,

    /// Read the encoded message from a file
    #[arg(short, long)]
    file: Option<PathBuf>,

    #[command(flatten)]
    encoding: EncodingMode,

    /// Inflate zlib-compressed content after decoding the text encoding
    #[arg(long)]
    zlib: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "console")]
    format: OutputFormat,

    /// Maximum nesting depth before decoding is aborted
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Payloads shorter than this are never probed as nested messages
    #[arg(long, default_value = "0")]
    min_nested_len: usize,

    /// Bytes of undecodable payload shown before truncating with "..."
    #[arg(long, default_value = "32")]
    preview_limit: usize,

    /// Extra charset to try after UTF-8 (WHATWG label, e.g. gbk, sjis)
    #[cfg(feature = "legacy-charsets")]
    #[arg(long = "charset")]
    charsets: Vec<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Text encoding of the input; hex when no flag is given
#[derive(Args, Debug)]
#[group(required = false, multiple = false)]
struct EncodingMode {
    /// Input is raw binary
    #[arg(long)]
    bin: bool,

    /// Input is standard base64
    #[arg(long)]
    b64: bool,

    /// Input is `xxd` output (offset column and ASCII column are ignored)
    #[arg(long)]
    xxd: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputEncoding {
    Hex,
    Binary,
    Base64,
    Xxd,
}

impl EncodingMode {
    fn resolve(&self) -> InputEncoding {
        if self.bin {
            InputEncoding::Binary
        } else if self.b64 {
            InputEncoding::Base64
        } else if self.xxd {
            InputEncoding::Xxd
        } else {
            InputEncoding::Hex
        }
    }
}

/// Output format for the decoded tree
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Plain text
    Plain,
    /// ANSI-coloured text
    Console,
    /// HTML fragment
    Html,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let raw = read_input(&cli)?;
    let data = preprocess(raw, cli.encoding.resolve(), cli.zlib)?;
    info!("Decoding {} bytes", data.len());

    let decoder = Decoder::with_config(
        DecoderConfig::new()
            .max_depth(cli.max_depth)
            .min_nested_len(cli.min_nested_len),
    );
    let outcome = decoder.decode(&data);

    let renderer: &dyn Renderer = match cli.format {
        OutputFormat::Plain => &PlainRenderer,
        OutputFormat::Console => &ConsoleRenderer,
        OutputFormat::Html => &HtmlRenderer,
    };
    let text = TreeRenderer::new(renderer)
        .with_resolver(build_resolver(&cli)?)
        .with_config(RenderConfig::new().leaf_preview_limit(cli.preview_limit))
        .render(outcome.fields());
    print!("{}", text);

    match outcome.error() {
        None => Ok(ExitCode::SUCCESS),
        Some(e) => {
            eprintln!(
                "decoding stopped after {} field(s): {}",
                outcome.fields().len(),
                e
            );
            Ok(ExitCode::from(2))
        }
    }
}

/// Read the encoded message from the argument, a file, or stdin
fn read_input(cli: &Cli) -> Result<Vec<u8>> {
    if let Some(ref input) = cli.input {
        trace!("Reading input from argument");
        return Ok(input.as_bytes().to_vec());
    }

    if let Some(ref file) = cli.file {
        trace!("Reading {}", file.display());
        return fs::read(file)
            .with_context(|| format!("Failed to read input file: {}", file.display()));
    }

    trace!("Reading input from stdin");
    let mut buf = Vec::new();
    io::stdin()
        .read_to_end(&mut buf)
        .context("Failed to read stdin")?;
    Ok(buf)
}

/// Turn the raw input into the single byte buffer handed to the decoder
fn preprocess(raw: Vec<u8>, encoding: InputEncoding, zlib: bool) -> Result<Vec<u8>> {
    let data = match encoding {
        InputEncoding::Binary => raw,
        InputEncoding::Hex => decode_hex(&as_text(&raw)?)?,
        InputEncoding::Xxd => decode_hex(&strip_xxd_columns(&as_text(&raw)?))?,
        InputEncoding::Base64 => {
            let compact: String = as_text(&raw)?.split_whitespace().collect();
            base64::engine::general_purpose::STANDARD
                .decode(compact)
                .context("Input is not valid base64")?
        }
    };
    debug!("Input decoded to {} bytes ({:?})", data.len(), encoding);

    if !zlib {
        return Ok(data);
    }

    let mut inflated = Vec::new();
    flate2::read::ZlibDecoder::new(data.as_slice())
        .read_to_end(&mut inflated)
        .context("Input is not valid zlib data")?;
    debug!("Inflated to {} bytes", inflated.len());
    Ok(inflated)
}

fn as_text(raw: &[u8]) -> Result<String> {
    String::from_utf8(raw.to_vec()).context("Encoded input is not valid UTF-8 text")
}

/// Hex with any whitespace in between (spaces, newlines, tabs)
fn decode_hex(text: &str) -> Result<Vec<u8>> {
    let compact: String = text.split_whitespace().collect();
    hex::decode(compact).context("Input is not valid hex")
}

/// Keep only the hex column of `xxd` output.
///
/// A line looks like `00000000: 0802 1203 6162 63  .....abc`; the offset ends
/// at the first `:` and the ASCII column starts after a double space.
fn strip_xxd_columns(text: &str) -> String {
    text.lines()
        .map(|line| {
            let hex = line.split_once(':').map_or(line, |(_, rest)| rest);
            let hex = hex.trim_start();
            hex.split_once("  ").map_or(hex, |(columns, _)| columns)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(not(feature = "legacy-charsets"))]
fn build_resolver(_cli: &Cli) -> Result<CharsetResolver> {
    Ok(CharsetResolver::default())
}

#[cfg(feature = "legacy-charsets")]
fn build_resolver(cli: &Cli) -> Result<CharsetResolver> {
    use unwire_core::LegacyCharset;

    let mut resolver = CharsetResolver::default();
    for label in &cli.charsets {
        let charset = LegacyCharset::for_label(label)
            .with_context(|| format!("Unknown charset label: {}", label))?;
        debug!("Adding charset probe {}", unwire_core::Charset::name(&charset));
        resolver = resolver.with_probe(charset);
    }
    Ok(resolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_preprocess_hex() {
        let data = preprocess(b"080d".to_vec(), InputEncoding::Hex, false).unwrap();
        assert_eq!(data, vec![0x08, 0x0D]);

        let data = preprocess(b"08 0d\n12 03\t616263\n".to_vec(), InputEncoding::Hex, false)
            .unwrap();
        assert_eq!(data, vec![0x08, 0x0D, 0x12, 0x03, 0x61, 0x62, 0x63]);

        assert!(preprocess(b"08z".to_vec(), InputEncoding::Hex, false).is_err());
    }

    #[test]
    fn test_preprocess_base64() {
        let data = preprocess(b"CA0=\n".to_vec(), InputEncoding::Base64, false).unwrap();
        assert_eq!(data, vec![0x08, 0x0D]);
        assert!(preprocess(b"!!".to_vec(), InputEncoding::Base64, false).is_err());
    }

    #[test]
    fn test_preprocess_binary_passthrough() {
        let raw = vec![0xFF, 0x00, 0x80];
        assert_eq!(
            preprocess(raw.clone(), InputEncoding::Binary, false).unwrap(),
            raw
        );
    }

    #[test]
    fn test_preprocess_xxd() {
        let dump = "00000000: 0802 1203 6162 63                        ....abc\n";
        let data = preprocess(dump.as_bytes().to_vec(), InputEncoding::Xxd, false).unwrap();
        assert_eq!(data, vec![0x08, 0x02, 0x12, 0x03, 0x61, 0x62, 0x63]);
    }

    #[test]
    fn test_strip_xxd_columns_without_offsets() {
        assert_eq!(strip_xxd_columns("0802 1203"), "0802 1203");
    }

    #[test]
    fn test_preprocess_zlib() {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&[0x08, 0x0D]).unwrap();
        let compressed = encoder.finish().unwrap();

        let data = preprocess(compressed.clone(), InputEncoding::Binary, true).unwrap();
        assert_eq!(data, vec![0x08, 0x0D]);

        let hex_text = hex::encode(&compressed).into_bytes();
        let data = preprocess(hex_text, InputEncoding::Hex, true).unwrap();
        assert_eq!(data, vec![0x08, 0x0D]);

        assert!(preprocess(vec![0x08, 0x0D], InputEncoding::Binary, true).is_err());
    }

    #[test]
    fn test_read_input_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"120161").unwrap();

        let cli = Cli::parse_from(["unwire", "--file", file.path().to_str().unwrap()]);
        assert_eq!(read_input(&cli).unwrap(), b"120161".to_vec());
        assert_eq!(cli.encoding.resolve(), InputEncoding::Hex);
    }

    #[test]
    fn test_read_input_from_argument() {
        let cli = Cli::parse_from(["unwire", "--b64", "CA0="]);
        assert_eq!(read_input(&cli).unwrap(), b"CA0=".to_vec());
        assert_eq!(cli.encoding.resolve(), InputEncoding::Base64);
    }

    #[test]
    fn test_encoding_flags_are_exclusive() {
        assert!(Cli::try_parse_from(["unwire", "--bin", "--b64", "x"]).is_err());
        assert!(Cli::try_parse_from(["unwire", "--file", "a", "080d"]).is_err());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
