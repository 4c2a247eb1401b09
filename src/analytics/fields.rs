//! Lenient accessors over REST payloads
//!
//! The enterprise API schema is provisional, so every engine reads fields
//! through these helpers: a missing or mistyped field yields `None` or the
//! caller's default and never an error.

use serde_json::Value;

/// Resolve a dotted path such as `summary.success_rate_percent`
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Numeric field, accepting numbers and numeric strings
///
/// Non-finite values such as `"NaN"` or `"inf"` count as absent.
pub fn number(value: &Value, path: &str) -> Option<f64> {
    let number = match lookup(value, path)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Numeric field with a default
pub fn number_or(value: &Value, path: &str, default: f64) -> f64 {
    number(value, path).unwrap_or(default)
}

/// First numeric field found among several candidate paths
pub fn first_number(value: &Value, paths: &[&str]) -> Option<f64> {
    paths.iter().find_map(|p| number(value, p))
}

/// String field, `"unknown"` when absent
pub fn text<'a>(value: &'a Value, path: &str) -> &'a str {
    lookup(value, path)
        .and_then(Value::as_str)
        .unwrap_or("unknown")
}

/// First string field found among several candidate paths
pub fn first_text<'a>(value: &'a Value, paths: &[&str]) -> &'a str {
    paths
        .iter()
        .find_map(|p| lookup(value, p).and_then(Value::as_str))
        .unwrap_or("unknown")
}

/// Array field, empty when absent or not an array
pub fn array<'a>(value: &'a Value, path: &str) -> &'a [Value] {
    lookup(value, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Collect a numeric field across the items of an array
pub fn numbers_in(items: &[Value], path: &str) -> Vec<f64> {
    items.iter().filter_map(|item| number(item, path)).collect()
}
