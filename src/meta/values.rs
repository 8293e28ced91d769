//! meta::values
//!
//! JSON key/value view over a metadata blob.
//!
//! Metadata payloads are opaque bytes to the engine; the `setvalue` and
//! `getvalue` commands, and `get --json`, are the only consumers that
//! interpret them. They require the blob to be a JSON object and fail
//! with [`MetaError::Format`] otherwise.

use serde_json::{Map, Value};

use crate::meta::error::MetaError;

/// Merge `key = value` into a JSON object payload.
///
/// An absent payload starts from `{}`. The value is stored as a JSON
/// string. Returns the re-serialized payload.
pub fn merge_value(existing: Option<&[u8]>, key: &str, value: &str) -> Result<Vec<u8>, MetaError> {
    let mut object = match existing {
        Some(bytes) => parse_object(bytes)?,
        None => Map::new(),
    };

    object.insert(key.to_string(), Value::String(value.to_string()));

    serde_json::to_vec(&Value::Object(object)).map_err(|e| MetaError::Format {
        message: format!("could not serialize metadata: {}", e),
    })
}

/// List the `(key, value)` pairs of a JSON object payload.
///
/// `key` and `value` filters each keep only exactly-matching rows; values
/// are compared against their rendered form.
pub fn filter_values(
    bytes: &[u8],
    key: Option<&str>,
    value: Option<&str>,
) -> Result<Vec<(String, String)>, MetaError> {
    let object = parse_object(bytes)?;

    let mut rows = Vec::new();
    for (k, v) in object {
        let rendered = render(&v);
        if key.is_some_and(|want| want != k) {
            continue;
        }
        if value.is_some_and(|want| want != rendered) {
            continue;
        }
        rows.push((k, rendered));
    }

    Ok(rows)
}

/// Pretty-print a JSON payload.
pub fn pretty(bytes: &[u8]) -> Result<String, MetaError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|_| not_json())?;
    serde_json::to_string_pretty(&value).map_err(|e| MetaError::Format {
        message: format!("could not render metadata: {}", e),
    })
}

/// Render a JSON value the way it reads in a table cell: strings bare,
/// everything else in JSON notation.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_object(bytes: &[u8]) -> Result<Map<String, Value>, MetaError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|_| not_json())?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(MetaError::Format {
            message: "metadata is not a JSON object".to_string(),
        }),
    }
}

fn not_json() -> MetaError {
    MetaError::Format {
        message: "not JSON data (use --dump to show the file anyway)".to_string(),
    }
}
