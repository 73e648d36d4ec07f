use std::io::{self, Read};

use dcf_core::{DcfError, DcfResult};
use serde_json::Value;

/// Read a JSON document piped on stdin.
///
/// `None` when stdin is a terminal or the pipe carried only whitespace.
pub fn read_stdin() -> DcfResult<Option<Value>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| DcfError::Collaborator(format!("Failed to read stdin: {e}")))?;
    parse_piped(&buffer)
}

fn parse_piped(text: &str) -> DcfResult<Option<Value>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(trimmed)?))
}
