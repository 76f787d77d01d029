//! Single-condition evaluation: `(actual, operator, expected) -> bool`.
//!
//! Total by construction: every operator/value combination yields a bool,
//! and anything that cannot be compared yields `false`.

use copilot_core::FieldValue;

use crate::schema::ConditionOp;

/// Apply `op` between an entry value and a rule comparand.
pub fn apply(actual: &FieldValue, op: &ConditionOp, expected: &FieldValue) -> bool {
    match op {
        ConditionOp::Equals => strict_equals(actual, expected),
        ConditionOp::NotEquals => !strict_equals(actual, expected),
        ConditionOp::GreaterThan => parse_float(actual) > parse_float(expected),
        ConditionOp::LessThan => parse_float(actual) < parse_float(expected),
        ConditionOp::Includes => match actual {
            FieldValue::Text(haystack) => haystack.contains(expected.display_string().as_str()),
            _ => false,
        },
        ConditionOp::Unsupported(_) => false,
    }
}

/// Same-type equality without coercion. Composites compare by identity and
/// two values read separately are never identical.
fn strict_equals(a: &FieldValue, b: &FieldValue) -> bool {
    match (a, b) {
        (FieldValue::Text(x), FieldValue::Text(y)) => x == y,
        (FieldValue::Number(x), FieldValue::Number(y)) => x == y,
        (FieldValue::Boolean(x), FieldValue::Boolean(y)) => x == y,
        (FieldValue::Null, FieldValue::Null) => true,
        (FieldValue::Absent, FieldValue::Absent) => true,
        _ => false,
    }
}

/// Numeric view of a value. Text is parsed by its longest numeric prefix
/// after leading whitespace; everything non-numeric is NaN.
pub fn parse_float(value: &FieldValue) -> f64 {
    match value {
        FieldValue::Number(n) => *n,
        FieldValue::Text(s) => parse_float_prefix(s),
        _ => f64::NAN,
    }
}

fn parse_float_prefix(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        let sign = if bytes.first() == Some(&b'-') { -1.0 } else { 1.0 };
        return sign * f64::INFINITY;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return f64::NAN;
    }

    // Exponent only counts when at least one digit follows it.
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

    // A bare trailing "." ("5.") is valid for Rust's parser as well.
    s[..end].parse().unwrap_or(f64::NAN)
}
