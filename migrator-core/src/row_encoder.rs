//! Component C: encodes a row of already-shaped field values into one line of PostgreSQL's COPY
//! text format. Field shaping (hex-encoding binary/spatial columns, zero-date substitution) is
//! the Data Pipeline's job (§4.F.2); this module only knows how to escape and join.

/// One field in a row, already shaped by the data pipeline's projection step.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum EncodedField {
    Null,
    /// A value that is emitted as `\x` followed by these hex digits (bytea hex input).
    Hex(String),
    /// Any other text value, escaped per the COPY text rules.
    Text(String),
}

/// Encodes one row as a single COPY text line, without the trailing newline (the caller joins
/// lines with `\n` when assembling a chunk).
pub fn encode_row(fields: &[EncodedField]) -> String {
    fields
        .iter()
        .map(encode_field)
        .collect::<Vec<_>>()
        .join("\t")
}

fn encode_field(field: &EncodedField) -> String {
    match field {
        EncodedField::Null => "\\N".to_string(),
        EncodedField::Hex(hex) => format!("\\x{hex}"),
        EncodedField::Text(text) => escape_text(text),
    }
}

/// Escapes the characters COPY text format requires backslash-escaped: backslash itself,
/// newline, carriage return, and tab.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}
