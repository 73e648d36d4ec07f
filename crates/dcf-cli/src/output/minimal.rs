use serde_json::Value;

use super::format_scalar;

// Key answer fields, highest priority first.
const PRIORITY_KEYS: &[&str] = &[
    "price_per_share",
    "wacc",
    "equity_value",
    "enterprise_value",
    "yoy_growth",
];

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields in order of priority, then falls back
/// to the first field in the result object.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result_obj {
        Value::Object(map) => {
            for key in PRIORITY_KEYS {
                if let Some(val) = map.get(*key) {
                    if !val.is_null() {
                        return format_scalar(val);
                    }
                }
            }
            match map.iter().next() {
                Some((key, val)) => format!("{}: {}", key, format_scalar(val)),
                None => String::new(),
            }
        }
        Value::Array(arr) => format!("{} records", arr.len()),
        other => format_scalar(other),
    }
}
