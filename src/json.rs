//! JSON input reader.
//!
//! Publisher JSON exports are a top-level array of records. Each record is
//! deserialized into the loader's own typed schema.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;
use crate::error::LoadError;

pub fn read_path<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let input = std::fs::read_to_string(path)?;
    parse(&input)
}

/// Parses a JSON array into records.
///
/// Anything other than an array at the top level is rejected.
pub fn parse<T: DeserializeOwned>(input: &str) -> Result<Vec<T>> {
    let value: Value = serde_json::from_str(input)?;
    let Value::Array(items) = value else {
        return Err(LoadError::UnexpectedShape(format!(
            "expected a JSON array of records, found {}",
            kind(&value)
        )));
    };
    log::debug!("read {} JSON records", items.len());
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(LoadError::from))
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Reads a value that exporters write either as a string or as a number.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
