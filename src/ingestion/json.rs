//! JSON loading.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"a":1}, {"a":2}]`
//! - A single JSON object: `{"a":1}`
//! - Newline-delimited JSON (NDJSON): `{"a":1}\n{"a":2}\n`
//!
//! Nested objects are flattened into dot-path columns (`{"user":{"name":"Ada"}}` becomes a
//! `user.name` column). Arrays become [`Value::List`] cells.

use std::collections::{HashMap, HashSet};

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataSet, Value};

use super::infer::dataset_from_values;

/// Load JSON bytes into an in-memory [`DataSet`].
pub fn load_json_from_bytes(bytes: &[u8]) -> IngestionResult<DataSet> {
    let text = std::str::from_utf8(bytes).map_err(|e| IngestionError::SchemaMismatch {
        message: format!("json input is not valid utf-8: {e}"),
    })?;
    load_json_from_str(text)
}

/// Load JSON from an in-memory string into a [`DataSet`].
pub fn load_json_from_str(input: &str) -> IngestionResult<DataSet> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(IngestionError::SchemaMismatch {
            message: "json input is empty".to_string(),
        });
    }

    // First try parsing as a single JSON value (array or object).
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(trimmed) {
        match v {
            serde_json::Value::Array(items) => load_json_values(&items),
            serde_json::Value::Object(_) => load_json_values(std::slice::from_ref(&v)),
            _ => Err(IngestionError::SchemaMismatch {
                message: "json must be an object, an array of objects, or NDJSON".to_string(),
            }),
        }
    } else {
        // Fall back to NDJSON.
        let mut values = Vec::new();
        for (i, line) in trimmed.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let v = serde_json::from_str::<serde_json::Value>(line).map_err(|e| {
                IngestionError::SchemaMismatch {
                    message: format!("invalid ndjson at line {}: {}", i + 1, e),
                }
            })?;
            values.push(v);
        }
        load_json_values(&values)
    }
}

fn load_json_values(values: &[serde_json::Value]) -> IngestionResult<DataSet> {
    let mut names: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(values.len());

    for (idx0, v) in values.iter().enumerate() {
        let row_num = idx0 + 1;
        let obj = v.as_object().ok_or_else(|| IngestionError::SchemaMismatch {
            message: format!("row {row_num} is not a json object"),
        })?;

        let mut flat: Vec<(String, Value)> = Vec::new();
        flatten_object(obj, "", &mut flat);

        // `{"a.b": 1}` and `{"a": {"b": 2}}` flatten to the same column.
        let mut in_row: HashSet<&str> = HashSet::with_capacity(flat.len());
        for (name, _) in &flat {
            if !in_row.insert(name.as_str()) {
                return Err(IngestionError::SchemaMismatch {
                    message: format!("row {row_num} has more than one value for column '{name}'"),
                });
            }
        }

        let mut row = vec![Value::Null; names.len()];
        for (name, value) in flat {
            let idx = match positions.get(&name) {
                Some(&idx) => idx,
                None => {
                    let idx = names.len();
                    positions.insert(name.clone(), idx);
                    names.push(name);
                    row.push(Value::Null);
                    idx
                }
            };
            row[idx] = value;
        }
        rows.push(row);
    }

    dataset_from_values(names, rows)
}

fn flatten_object(
    obj: &serde_json::Map<String, serde_json::Value>,
    prefix: &str,
    out: &mut Vec<(String, Value)>,
) {
    for (key, v) in obj {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match v {
            serde_json::Value::Object(inner) if !inner.is_empty() => flatten_object(inner, &name, out),
            other => out.push((name, convert_json_value(other))),
        }
    }
}

fn convert_json_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int64(i),
            None => n.as_f64().map(Value::Float64).unwrap_or(Value::Null),
        },
        serde_json::Value::String(s) => Value::Utf8(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(convert_json_value).collect()),
        // Empty objects carry no columns.
        serde_json::Value::Object(_) => Value::Null,
    }
}
