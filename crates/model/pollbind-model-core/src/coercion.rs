//! Loose (coercive) equality between primitive values.
//!
//! Rules:
//! - `Undefined` and `Null` equal each other and nothing else
//! - number vs text compares numerically after converting the text
//! - a boolean compares as 1 / 0 against numbers and text
//! - containers are equal only to themselves (identity)
//! - `NaN` is never equal to anything, itself included

use crate::Value;

/// Loose equality used by the structural comparator for non-structured pairs.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Text(x), Value::Text(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Object(x), Value::Object(y)) => x.ptr_eq(y),
        (Value::Object(_), _) | (_, Value::Object(_)) => false,
        (Value::Number(n), Value::Text(s)) | (Value::Text(s), Value::Number(n)) => {
            *n == text_to_number(s)
        }
        (Value::Bool(flag), other) | (other, Value::Bool(flag)) => {
            loose_eq(&Value::Number(bool_to_number(*flag)), other)
        }
    }
}

/// Numeric view of a primitive; containers and `Undefined` are `NaN`.
pub fn to_number(v: &Value) -> f64 {
    match v {
        Value::Undefined | Value::Object(_) => f64::NAN,
        Value::Null => 0.0,
        Value::Bool(b) => bool_to_number(*b),
        Value::Number(n) => *n,
        Value::Text(s) => text_to_number(s),
    }
}

fn bool_to_number(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Host-style string to number conversion: surrounding whitespace is ignored,
/// an empty string is 0, `0x`/`0o`/`0b` prefixes select the radix, and any
/// other malformed input is `NaN`.
pub fn text_to_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = t.strip_prefix(prefix) {
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return f64::NAN;
            }
            return u64::from_str_radix(digits, radix)
                .map(|n| n as f64)
                .unwrap_or(f64::NAN);
        }
    }
    let decimal_chars = t
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if decimal_chars {
        t.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullish_values_only_equal_each_other() {
        assert!(loose_eq(&Value::Undefined, &Value::Null));
        assert!(!loose_eq(&Value::Null, &Value::from(0)));
        assert!(!loose_eq(&Value::Undefined, &Value::from("")));
    }

    #[test]
    fn numbers_and_text_compare_numerically() {
        assert!(loose_eq(&Value::from(0), &Value::from("0")));
        assert!(loose_eq(&Value::from("  12 "), &Value::from(12)));
        assert!(loose_eq(&Value::from(0), &Value::from("")));
        assert!(loose_eq(&Value::from(255), &Value::from("0xff")));
        assert!(!loose_eq(&Value::from(1), &Value::from("one")));
    }

    #[test]
    fn booleans_coerce_to_numbers() {
        assert!(loose_eq(&Value::from(true), &Value::from(1)));
        assert!(loose_eq(&Value::from(false), &Value::from("0")));
        assert!(!loose_eq(&Value::from(true), &Value::from("true")));
    }

    #[test]
    fn nan_is_never_equal() {
        let nan = Value::Number(f64::NAN);
        assert!(!loose_eq(&nan, &nan));
        assert!(to_number(&Value::from("Infinityx")).is_nan());
        assert!(text_to_number("inf").is_nan());
    }

    #[test]
    fn containers_compare_by_identity() {
        let a = Value::empty_map();
        assert!(loose_eq(&a, &a.clone()));
        assert!(!loose_eq(&a, &Value::empty_map()));
        assert!(!loose_eq(&a, &Value::from("[object Object]")));
    }
}
