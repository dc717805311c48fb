//! Import/export configuration types
//!
//! The parser and serializer work on Unicode text only. These options describe
//! how bytes on disk are turned into that text and back.

use serde::{Deserialize, Serialize};

/// Character encoding used to decode DBC bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// UTF-8 (with or without BOM), falling back to GB18030, then Latin-1
    #[default]
    Auto,
    /// Strict UTF-8
    Utf8,
    /// GB18030, a superset of GBK and GB2312
    #[serde(alias = "gbk")]
    Gb18030,
    /// ISO-8859-1, every byte maps to one code point
    Latin1,
}

/// Line terminator written on export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// `\r\n`, what most DBC consumers expect
    #[default]
    Crlf,
    /// `\n`
    Lf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Crlf => "\r\n",
            LineEnding::Lf => "\n",
        }
    }
}

/// Options for reading a DBC file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    #[serde(default)]
    pub encoding: TextEncoding,
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the input encoding
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Options for writing a DBC file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Line terminator (default: CRLF)
    #[serde(default)]
    pub line_ending: LineEnding,

    /// Prefix the output with a UTF-8 byte-order mark
    #[serde(default)]
    pub utf8_bom: bool,
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the line terminator
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Builder method: enable or disable the UTF-8 BOM
    pub fn with_bom(mut self, enabled: bool) -> Self {
        self.utf8_bom = enabled;
        self
    }

    /// Normalize line endings and encode serialized text to bytes
    pub fn encode(&self, text: &str) -> Vec<u8> {
        let normalized = normalize_line_endings(text, self.line_ending);
        let mut out = Vec::with_capacity(normalized.len() + 3);
        if self.utf8_bom {
            out.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
        }
        out.extend_from_slice(normalized.as_bytes());
        out
    }
}

/// Replace every `\r\n` or lone `\n` with the requested terminator
pub fn normalize_line_endings(text: &str, line_ending: LineEnding) -> String {
    let unified = text.replace("\r\n", "\n");
    match line_ending {
        LineEnding::Lf => unified,
        LineEnding::Crlf => unified.replace('\n', "\r\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let export = ExportOptions::new();
        assert_eq!(export.line_ending, LineEnding::Crlf);
        assert!(!export.utf8_bom);
        assert_eq!(ImportOptions::new().encoding, TextEncoding::Auto);
    }

    #[test]
    fn test_encode_crlf_with_bom() {
        let export = ExportOptions::new().with_bom(true);
        assert_eq!(export.encode("a\nb\r\nc"), b"\xEF\xBB\xBFa\r\nb\r\nc".to_vec());
    }

    #[test]
    fn test_encode_lf() {
        let export = ExportOptions::new().with_line_ending(LineEnding::Lf);
        assert_eq!(export.encode("a\r\nb\n"), b"a\nb\n".to_vec());
    }

    #[test]
    fn test_deserialize_lowercase_names() {
        let export: ExportOptions =
            serde_json::from_str(r#"{"line_ending": "lf", "utf8_bom": true}"#).unwrap();
        assert_eq!(export, ExportOptions::new().with_line_ending(LineEnding::Lf).with_bom(true));

        let import: ImportOptions = serde_json::from_str(r#"{"encoding": "latin1"}"#).unwrap();
        assert_eq!(import.encoding, TextEncoding::Latin1);

        let gbk: ImportOptions = serde_json::from_str(r#"{"encoding": "gbk"}"#).unwrap();
        assert_eq!(gbk.encoding, TextEncoding::Gb18030);

        let empty: ImportOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.encoding, TextEncoding::Auto);
    }
}
