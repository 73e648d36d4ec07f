use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_scalar, period_rows};

/// Format output as tables using the tabled crate.
///
/// Scalars of the result become a Field/Value table; the per-year
/// projection, when present, is printed as a second table underneath.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (key, val) in res_map {
                if key == "years" || val.is_object() || val.is_null() {
                    continue;
                }
                builder.push_record([key.as_str(), &format_value(val)]);
            }
            println!("{}", Table::from(builder));

            if let Some(Value::Object(wacc)) = res_map.get("wacc_breakdown") {
                println!("\nWACC breakdown:");
                print_flat_object(wacc);
            }

            if let Some(rows) = period_rows(result) {
                println!("\nProjection:");
                print_array_table(rows);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        other => println!("{}", format_value(other)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        other => format_scalar(other),
    }
}
