use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

pub const LIST_DELIMITER: &str = ", ";

/// NFKC-normalizes a line, strips control characters and collapses runs of
/// whitespace.
pub fn normalize_line(line: &str) -> String {
    let trimmed = line.trim_matches(|c: char| c.is_control() || c.is_whitespace());
    let nfkc = trimmed.nfkc().collect::<String>();
    let mut result = String::with_capacity(nfkc.len());
    let mut prev_space = false;
    for ch in nfkc.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                result.push(' ');
                prev_space = true;
            }
        } else if ch.is_control() {
            continue;
        } else {
            result.push(ch);
            prev_space = false;
        }
    }
    result.trim().to_string()
}

/// Coerces a scalar-ish JSON value to display text.
///
/// Lists of scalars are joined with [`LIST_DELIMITER`]. `null`, objects and
/// values that normalize to nothing yield `None`.
pub fn coerce_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(scalar_text)
            .collect::<Vec<_>>()
            .join(LIST_DELIMITER),
        other => scalar_text(other)?,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub fn coerce_text_or(value: Option<&Value>, placeholder: &str) -> String {
    value
        .and_then(coerce_text)
        .unwrap_or_else(|| placeholder.to_string())
}

/// Coerces a value that may be a single string or a list of strings into
/// ordered lines.
pub fn coerce_lines(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        other => scalar_text(other).into_iter().collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinate {
    Missing,
    Invalid,
    Value(f64),
}

/// Reads a coordinate that may arrive as a number or a numeric string.
pub fn coerce_coordinate(value: Option<&Value>) -> Coordinate {
    let parsed = match value {
        None | Some(Value::Null) => return Coordinate::Missing,
        Some(Value::Number(num)) => num.as_f64(),
        Some(Value::String(raw)) => raw.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Coordinate::Value(v),
        _ => Coordinate::Invalid,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => normalize_line(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
