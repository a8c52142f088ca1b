//! Numeric payload validation.

/// Whether `text` is a complete decimal number, optionally preceded by ASCII
/// whitespace and followed by a single `\n`.
///
/// Integers, decimals, an explicit sign and exponent notation are accepted
/// (`42`, `-3`, `42.5`, `+1e5`, ` 42`). Empty or whitespace-only input,
/// trailing characters and the `inf`/`nan` spellings are rejected. Magnitude
/// is not checked: the payload is kept as text, never converted.
pub fn is_numeric(text: &str) -> bool {
    let body = text
        .strip_suffix('\n')
        .unwrap_or(text)
        .trim_start_matches(|c: char| c.is_ascii_whitespace());
    if !body.bytes().any(|b| b.is_ascii_digit()) {
        return false;
    }
    body.parse::<f64>().is_ok()
}
