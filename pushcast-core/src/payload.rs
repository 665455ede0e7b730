//! Loading device tokens and payloads from files and strings

use crate::models::Payload;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading tokens or payloads
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Failed to read token file ({path}): {source}")]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read payload file ({path}): {source}")]
    PayloadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Payload is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Split newline-separated tokens (`\n` or `\r\n`), dropping blank lines
pub fn parse_token_lines(text: &str) -> Vec<String> {
    collect_tokens(text.split('\n'))
}

/// Split comma-separated tokens, dropping empty entries
pub fn parse_token_list(text: &str) -> Vec<String> {
    collect_tokens(text.split(','))
}

fn collect_tokens<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<String> {
    parts
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read one token per line from a file
pub fn read_token_file(path: &Path) -> Result<Vec<String>, PayloadError> {
    let content = std::fs::read_to_string(path).map_err(|source| PayloadError::TokenFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_token_lines(&content))
}

/// Parse a payload string; it must be a JSON object
pub fn parse_payload(text: &str) -> Result<Payload, PayloadError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(PayloadError::NotAnObject(json_kind(&other))),
    }
}

/// Read and parse a payload file
pub fn read_payload_file(path: &Path) -> Result<Payload, PayloadError> {
    let content = std::fs::read_to_string(path).map_err(|source| PayloadError::PayloadFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_payload(&content)
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Remove a comma (and any whitespace after it) that directly precedes a
/// closing `}` or `]`.
///
/// This is a textual pass: it does not know about string literals, so
/// `"a, }"` inside a string value is rewritten as well.
pub fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch == ',' {
            let rest = &text[idx + ch.len_utf8()..];
            let after_ws = rest.trim_start();
            if after_ws.starts_with('}') || after_ws.starts_with(']') {
                // Skip the whitespace run; the bracket is emitted next iteration.
                let skipped = rest.len() - after_ws.len();
                while let Some(&(next_idx, _)) = chars.peek() {
                    if next_idx >= idx + ch.len_utf8() + skipped {
                        break;
                    }
                    chars.next();
                }
                continue;
            }
        }
        out.push(ch);
    }

    out
}

/// Leniently repair and pretty-print JSON text with 2-space indentation.
///
/// Trailing commas before `}`/`]` are dropped first; anything else that is
/// not valid JSON is reported as a parse error.
pub fn format_lenient(text: &str) -> Result<String, PayloadError> {
    let repaired = strip_trailing_commas(text.trim());
    let value: Value = serde_json::from_str(&repaired)?;
    Ok(serde_json::to_string_pretty(&value)?)
}
