//! Encoding detection and header text cleanup for HWiNFO CSV exports.
//!
//! HWiNFO exports are typically ANSI/Windows-1252 or UTF-8, but some
//! systems produce UTF-16 with a BOM. The degree sign in `[°C]` headers is
//! frequently mangled by re-encoding, so cleaned header text is the
//! canonical form everywhere downstream.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use encoding_rs_io::DecodeReaderBytesBuilder;
use unicode_normalization::UnicodeNormalization;

/// Source encoding of a telemetry CSV, decided once per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    /// UTF-8 with a leading byte-order mark
    Utf8Sig,
    Utf16Le,
    Utf16Be,
    Windows1252,
}

impl SourceEncoding {
    /// Static encoding table entry used for decoding reads.
    pub fn encoding(self) -> &'static encoding_rs::Encoding {
        match self {
            SourceEncoding::Utf8 | SourceEncoding::Utf8Sig => encoding_rs::UTF_8,
            SourceEncoding::Utf16Le => encoding_rs::UTF_16LE,
            SourceEncoding::Utf16Be => encoding_rs::UTF_16BE,
            SourceEncoding::Windows1252 => encoding_rs::WINDOWS_1252,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SourceEncoding::Utf8 => "utf-8",
            SourceEncoding::Utf8Sig => "utf-8-sig",
            SourceEncoding::Utf16Le => "utf-16le",
            SourceEncoding::Utf16Be => "utf-16be",
            SourceEncoding::Windows1252 => "windows-1252",
        }
    }
}

/// Best-effort encoding detection for a telemetry CSV.
///
/// BOM sniffing first; otherwise each candidate encoding is tried on the
/// first line in a fixed preference order. Windows-1252 maps every byte,
/// so detection never fails outright.
pub fn sniff_encoding(path: &Path) -> SourceEncoding {
    let mut head = [0u8; 4];
    let head_len = File::open(path)
        .and_then(|mut f| f.read(&mut head))
        .unwrap_or(0);
    let head = &head[..head_len];

    if head.starts_with(&[0xFF, 0xFE]) {
        return SourceEncoding::Utf16Le;
    }
    if head.starts_with(&[0xFE, 0xFF]) {
        return SourceEncoding::Utf16Be;
    }
    if head.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return SourceEncoding::Utf8Sig;
    }

    for candidate in [SourceEncoding::Utf8, SourceEncoding::Utf8Sig] {
        if first_line_decodes(path, candidate) {
            return candidate;
        }
    }
    SourceEncoding::Windows1252
}

/// Try to read one line under the candidate encoding without decode errors.
fn first_line_decodes(path: &Path, encoding: SourceEncoding) -> bool {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };
    let decoder = DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding.encoding()))
        .build(file);
    let mut reader = BufReader::new(decoder);
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(_) => !line.contains('\u{FFFD}'),
        Err(_) => false,
    }
}

/// Open a file for reading, decoding from the detected source encoding.
///
/// The returned reader strips any BOM and yields UTF-8 bytes, suitable for
/// feeding straight into a `csv::Reader`.
pub fn open_decoded(path: &Path, encoding: SourceEncoding) -> std::io::Result<impl Read> {
    let file = File::open(path)?;
    Ok(DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding.encoding()))
        .bom_sniffing(true)
        .build(file))
}

/// Normalize common HWiNFO header/pattern text issues.
///
/// - Fix broken degree-sign renderings (`[�C]`, `Â°C`) back to `°C`.
/// - NFKC normalization, NBSP to space, collapse whitespace runs.
/// - Strip surrounding quotes.
pub fn clean_text(s: &str) -> String {
    let s = s
        .replace("[\u{FFFD}C]", "[\u{B0}C]")
        .replace("\u{FFFD}C", "\u{B0}C")
        .replace("[\u{C2}\u{B0}C]", "[\u{B0}C]")
        .replace("\u{C2}\u{B0}", "\u{B0}");

    let s: String = s.nfkc().collect();
    let s = s.replace('\u{A0}', " ");

    let mut out = String::with_capacity(s.len());
    let mut last_was_space = false;
    for ch in s.trim().chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out.trim().trim_matches('"').trim().to_string()
}
