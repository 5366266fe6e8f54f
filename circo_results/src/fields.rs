//! Reading values out of rows whose schema is not known in advance.

use serde_json::Value;

use crate::config::Row;

/// Values of an elected flag that count as "elected", once trimmed and lowercased.
const TRUTHY_FLAGS: [&str; 5] = ["oui", "yes", "true", "1", "elu"];

/// Returns the value of the first field of `aliases` that is present in the row,
/// not null and not the empty string.
///
/// An absent value is an expected outcome: most rows only carry a subset of the aliases.
pub fn resolve<'a>(row: &'a Row, aliases: &[String]) -> Option<&'a Value> {
    aliases.iter().find_map(|field| match row.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(v) => Some(v),
    })
}

/// Same as [resolve], with the value rendered as trimmed text.
///
/// Values that render to nothing (whitespace-only strings, arrays, objects) are skipped
/// and the next alias is tried.
pub fn resolve_text(row: &Row, aliases: &[String]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|field| row.get(field))
        .find_map(value_text)
}

/// The textual content of a scalar value. Integral numbers are rendered without decimals,
/// so that a code stored as `75.0` reads `75`.
pub fn value_text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 => format!("{:.0}", f),
                    Some(f) => f.to_string(),
                    None => return None,
                }
            }
        }
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Parses a score that may be written in the French style (`"1 234,5"`).
///
/// All the whitespace is removed (including the non-breaking spaces used as thousands
/// separators), the first comma becomes a decimal point, and the longest leading decimal
/// number is read, so that `"45,2 %"` gives 45.2.
///
/// None means "not a number": it ranks below any real score and is never zero.
pub fn parse_score(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
            let normalised = compact.replacen(',', ".", 1);
            leading_number(&normalised)
        }
        _ => None,
    }
}

// Reads the longest prefix of the form [+-]digits[.digits][e[+-]digits].
fn leading_number(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut num_digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        num_digits += frac_end - frac_start;
        if num_digits > 0 {
            end = frac_end;
        }
    }
    if num_digits == 0 {
        return None;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().ok().filter(|f| f.is_finite())
}

/// True for the numeric value 1, the boolean true, and the strings
/// `oui`, `yes`, `true`, `1` and `elu` (in any case).
pub fn is_truthy_flag(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::Bool(b) => *b,
        Value::String(s) => {
            let normalised = s.trim().to_lowercase();
            TRUTHY_FLAGS.contains(&normalised.as_str())
        }
        _ => false,
    }
}
