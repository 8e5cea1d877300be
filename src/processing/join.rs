//! Concatenation of tables with differing column sets.

use std::collections::HashMap;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataSet, Field, Schema, Value};

/// Concatenate `tables` into one [`DataSet`].
///
/// - The output columns are the union of all input columns, in first-seen order.
/// - A table missing a column contributes [`Value::Null`] for it.
/// - Rows keep concatenation order: table order, then each table's own row order.
/// - Column types are widened with [`crate::types::DataType::widen`]; integer cells in a column
///   that widens to `Float64` are promoted.
///
/// Returns [`IngestionError::SchemaConflict`] when the same column has types that cannot be
/// widened (e.g. `utf8` vs `int64`).
pub fn join(tables: &[DataSet]) -> IngestionResult<DataSet> {
    if let [single] = tables {
        return Ok(single.clone());
    }

    let mut fields: Vec<Field> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for table in tables {
        for field in &table.schema.fields {
            match positions.get(field.name.as_str()) {
                Some(&idx) => {
                    let existing = fields[idx].data_type;
                    fields[idx].data_type = existing.widen(field.data_type).ok_or_else(|| {
                        IngestionError::SchemaConflict {
                            column: field.name.clone(),
                            left: existing,
                            right: field.data_type,
                        }
                    })?;
                }
                None => {
                    positions.insert(field.name.as_str(), fields.len());
                    fields.push(field.clone());
                }
            }
        }
    }

    let total_rows = tables.iter().map(DataSet::row_count).sum();
    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(total_rows);
    for table in tables {
        // Output column index -> source column index.
        let projection: Vec<Option<usize>> = fields
            .iter()
            .map(|f| table.schema.index_of(&f.name))
            .collect();
        for row in &table.rows {
            rows.push(
                projection
                    .iter()
                    .zip(&fields)
                    .map(|(src, field)| match src {
                        Some(idx) => row[*idx].clone().promote(field.data_type),
                        None => Value::Null,
                    })
                    .collect(),
            );
        }
    }

    Ok(DataSet::new(Schema::new(fields), rows))
}
