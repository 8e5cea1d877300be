//! Column type inference shared by the format loaders.

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Build a [`DataSet`] from column names and already-typed rows.
///
/// Each column's [`DataType`] is the widening of all its values; `Int64` cells in a column that
/// widens to `Float64` are promoted. Rows shorter than `names` are padded with nulls.
pub(crate) fn dataset_from_values(
    names: Vec<String>,
    mut rows: Vec<Vec<Value>>,
) -> IngestionResult<DataSet> {
    let mut types = vec![DataType::Null; names.len()];
    for row in &mut rows {
        row.resize(names.len(), Value::Null);
        for (idx, value) in row.iter().enumerate() {
            let current = types[idx];
            types[idx] = current.widen(value.data_type()).ok_or_else(|| {
                IngestionError::SchemaMismatch {
                    message: format!(
                        "column '{}' mixes {} and {} values",
                        names[idx],
                        current,
                        value.data_type()
                    ),
                }
            })?;
        }
    }

    for row in &mut rows {
        for (idx, value) in row.iter_mut().enumerate() {
            if types[idx] == DataType::Float64 {
                *value = std::mem::replace(value, Value::Null).promote(DataType::Float64);
            }
        }
    }

    let schema = Schema::new(
        names
            .into_iter()
            .zip(types)
            .map(|(name, data_type)| Field::new(name, data_type))
            .collect(),
    );
    Ok(DataSet::new(schema, rows))
}

/// Reject duplicate or blank header names.
pub(crate) fn validate_headers(names: &[String]) -> IngestionResult<()> {
    for (idx, name) in names.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(IngestionError::SchemaMismatch {
                message: format!("column {} has an empty header", idx + 1),
            });
        }
        if names[..idx].contains(name) {
            return Err(IngestionError::SchemaMismatch {
                message: format!("duplicate column '{name}'"),
            });
        }
    }
    Ok(())
}
