//! Value coercion helpers.
//!
//! Every "is this a number", "is this empty" and "what type is this" decision
//! in the engine goes through this module so that range rules, distribution
//! statistics, outlier detection and accuracy checks agree on the answer.

use serde_json::Value;

/// Coerces a value to a finite number.
///
/// JSON numbers and numeric strings (surrounding whitespace ignored) are
/// accepted. Non-finite results such as `"NaN"` or `"inf"` are rejected so they
/// cannot poison statistics. Booleans, null, arrays and objects are never
/// numeric.
pub fn as_number(value: &Value) -> Option<f64> {
    let numeric = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match numeric {
        Some(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

/// Returns the value unless it is absent or JSON null.
pub fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Returns true for absent values, null, and empty or whitespace-only strings.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// JavaScript-style type name used for type histograms.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Renders a value for messages, pattern matching and record identifiers.
///
/// Strings are returned without quotes; everything else uses compact JSON.
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Canonical key for distinct-value counting.
///
/// The number `1` and the string `"1"` produce different keys.
pub fn value_key(value: &Value) -> String {
    value.to_string()
}

/// Loose equality used by conditional rules: numbers compare numerically,
/// everything else structurally.
pub fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => left == right,
    }
}
