//! Structural parser for class declarations.

mod state;
mod state_class_members;
mod state_statements;

pub use state::{ParseDiagnostic, ParserState};

/// Cooked value of a string literal token, quotes removed.
///
/// Handles the common escapes; anything unrecognized keeps the escaped
/// character as written.
pub fn literal_value(text: &str) -> String {
    let inner = text
        .strip_prefix(['"', '\''])
        .map(|rest| rest.strip_suffix(['"', '\'']).unwrap_or(rest))
        .unwrap_or(text);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                push_code_point(&mut out, &hex);
            }
            Some('u') => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                push_code_point(&mut out, &hex);
            }
            // Line continuation.
            Some('\n') => {}
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn push_code_point(out: &mut String, hex: &str) {
    match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
        Some(ch) => out.push(ch),
        None => out.push_str(hex),
    }
}

/// Canonical property key of a numeric literal: `0x10`, `16.0` and `16`
/// all name the property `"16"`.
pub fn numeric_key(text: &str) -> String {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    let cleaned = cleaned.strip_suffix('n').unwrap_or(&cleaned);
    let radix = match cleaned.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u128::from_str_radix(&cleaned[2..], radix)
            .map_or_else(|_| text.to_string(), |value| value.to_string());
    }
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => format!("{value}"),
        _ => text.to_string(),
    }
}
