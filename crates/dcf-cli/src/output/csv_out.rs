use serde_json::Value;
use std::io;

use super::{format_scalar, period_rows};

/// Write output as CSV to stdout.
///
/// A valuation writes one row per projected year; other results are written
/// as two-column field/value records.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let result = map.get("result");
            if let Some(rows) = result.and_then(period_rows) {
                write_array_csv(&mut wtr, rows);
            } else {
                match result {
                    Some(Value::Object(fields)) => write_fields(&mut wtr, fields),
                    Some(Value::Array(rows)) => write_array_csv(&mut wtr, rows),
                    _ => write_fields(&mut wtr, map),
                }
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_scalar(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_fields<W: io::Write>(wtr: &mut csv::Writer<W>, fields: &serde_json::Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in fields {
        let _ = wtr.write_record([key.as_str(), &format_scalar(val)]);
    }
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_scalar).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_scalar(item)]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_projection_rows_as_csv() {
        let rows = vec![
            json!({"year": 1, "revenue": "1040", "fcf": "131.456"}),
            json!({"year": 2, "revenue": "1081.6", "fcf": "136.71"}),
        ];
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_array_csv(&mut wtr, &rows);
        let bytes = wtr.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("fcf,revenue,year"));
        assert_eq!(lines.next(), Some("131.456,1040,1"));
    }
}
