//! Gold-standard answer comparison.
//!
//! Both payloads are encoded with a canonical form (object keys sorted, array
//! order kept, integral floats written as integers) and compared as strings,
//! so key insertion order never affects the outcome.

use serde_json::Value;

/// Largest integer an IEEE double represents exactly
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Canonical, order-independent JSON encoding
pub fn stable_stringify(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(flag) => out.push_str(if *flag { "true" } else { "false" }),
        Value::Number(number) => out.push_str(&canonical_number(number)),
        Value::String(text) => out.push_str(&quote(text)),
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));

            out.push('{');
            for (index, (key, item)) in entries.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&quote(key));
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
    }
}

fn canonical_number(number: &serde_json::Number) -> String {
    if let Some(int) = number.as_i64() {
        return int.to_string();
    }
    if let Some(uint) = number.as_u64() {
        return uint.to_string();
    }
    match number.as_f64() {
        Some(float) if float.is_finite() && float.fract() == 0.0 && float.abs() <= MAX_SAFE_INTEGER => {
            (float as i64).to_string()
        }
        _ => number.to_string(),
    }
}

fn quote(text: &str) -> String {
    // Serializing a str cannot fail
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""))
}

/// Compare a submission against the canonical answer.
///
/// Returns `None` when there is no canonical answer. A null, `false`, zero or
/// empty-string expected value counts as absent; empty objects and arrays do
/// not. A null submission is compared as an empty object.
pub fn matches_gold_answer(submitted: &Value, expected: Option<&Value>) -> Option<bool> {
    let expected = expected.filter(|value| !is_blank_answer(value))?;
    let submitted = if submitted.is_null() {
        stable_stringify(&Value::Object(Default::default()))
    } else {
        stable_stringify(submitted)
    };
    Some(submitted == stable_stringify(expected))
}

fn is_blank_answer(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
