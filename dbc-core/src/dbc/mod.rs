//! DBC text format
//!
//! Text → [`split_statements`] → [`parse_into`] → [`Project`](crate::Project),
//! and back through [`serialize`].

pub mod parser;
pub mod serializer;
pub mod splitter;

pub use parser::{
    parse, parse_into, recognize, synthetic_table_name, ParseSummary, Statement, StatementKind,
};
pub use serializer::{format_number, serialize, NAMESPACE_SYMBOLS};
pub use splitter::split_statements;

/// Remove a leading U+FEFF left over from decoding
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{FEFF}').unwrap_or(text)
}

/// Escape a string for use between double quotes: `\` → `\\`, then `"` → `\"`
pub fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Reverse [`escape`]; a backslash before any other character is kept as is
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(next @ ('\\' | '"')) => out.push(next),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_bom() {
        assert_eq!(strip_bom("\u{FEFF}VERSION \"\""), "VERSION \"\"");
        assert_eq!(strip_bom("VERSION"), "VERSION");
        assert_eq!(strip_bom("a\u{FEFF}"), "a\u{FEFF}");
    }

    #[test]
    fn test_escape_order() {
        assert_eq!(escape(r#"C:\dir "x""#), r#"C:\\dir \"x\""#);
        assert_eq!(escape(r#"\""#), r#"\\\""#);
    }

    #[test]
    fn test_unescape_reverses_escape() {
        for text in [r#"plain"#, r#"C:\dir "x""#, r#"\""#, "trailing\\", "多行\n文本"] {
            assert_eq!(unescape(&escape(text)), text);
        }
        assert_eq!(unescape(r"keep \n as is"), r"keep \n as is");
        assert_eq!(unescape("dangling\\"), "dangling\\");
    }
}
