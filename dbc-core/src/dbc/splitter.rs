//! Quote-aware statement splitting
//!
//! DBC mixes `;`-terminated statements (`CM_`, `VAL_`, `VAL_TABLE_`) with
//! line-terminated ones (`VERSION`, `BU_:`, `BO_`, `SG_`). Outside a quoted
//! string both a `;` and a line break end the current statement; inside one
//! they are kept verbatim, which lets comments span several lines.

/// Split DBC text into trimmed, non-empty statements.
///
/// A `;` that ends a statement is kept as its last character. A `"` toggles
/// the quoted state unless it is escaped by a preceding backslash; a backslash
/// only escapes the character right after it, so `\\"` still closes a string.
/// Never fails: an unterminated string runs to the end of the input and the
/// trailing partial statement is still returned.
pub fn split_statements(text: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut in_quote = false;
    let mut pending_escape = false;

    for (index, ch) in text.char_indices() {
        let escaped = std::mem::take(&mut pending_escape);
        match ch {
            // `\\` consumes its own escape, so the `"` in `\\"` toggles; matches `escape`
            '\\' if !escaped => pending_escape = true,
            '"' if !escaped => in_quote = !in_quote,
            ';' if !in_quote => {
                push_trimmed(&mut statements, &text[start..=index]);
                start = index + 1;
            }
            '\n' | '\r' if !in_quote => {
                push_trimmed(&mut statements, &text[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }

    push_trimmed(&mut statements, &text[start..]);
    statements
}

fn push_trimmed<'a>(statements: &mut Vec<&'a str>, raw: &'a str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed);
    }
}
