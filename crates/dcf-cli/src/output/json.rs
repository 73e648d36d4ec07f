use std::io::{self, Write};

use serde_json::Value;

/// Pretty-print JSON to stdout.
pub fn print_json(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_json(&mut stdout.lock(), value) {
        eprintln!("JSON output error: {}", e);
    }
}

/// Write `value` as pretty JSON followed by a newline.
pub fn write_json<W: Write>(out: &mut W, value: &Value) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}
