//! Duplicate row removal.

use std::collections::HashSet;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataSet, Value};

/// Returns a new [`DataSet`] keeping only the first row for each distinct combination of
/// values in `key_columns`.
///
/// - Retention is stable: surviving rows keep their original order.
/// - Nulls are equal to each other, so two rows with null keys are duplicates.
/// - An empty `key_columns` uses every column as the key.
///
/// Returns [`IngestionError::FilterConfiguration`] if a key column does not exist.
pub fn dedupe(dataset: &DataSet, key_columns: &[String]) -> IngestionResult<DataSet> {
    let key_idxs: Vec<usize> = if key_columns.is_empty() {
        (0..dataset.schema.fields.len()).collect()
    } else {
        key_columns
            .iter()
            .map(|name| {
                dataset
                    .schema
                    .index_of(name)
                    .ok_or_else(|| IngestionError::FilterConfiguration {
                        message: format!(
                            "dedup key column '{name}' does not exist. columns={:?}",
                            dataset.schema.field_names().collect::<Vec<_>>()
                        ),
                    })
            })
            .collect::<IngestionResult<_>>()?
    };

    let mut seen: HashSet<Vec<KeyAtom<'_>>> = HashSet::with_capacity(dataset.row_count());
    let mut rows = Vec::new();
    for row in &dataset.rows {
        let key: Vec<KeyAtom<'_>> = key_idxs.iter().map(|&i| KeyAtom::from(&row[i])).collect();
        if seen.insert(key) {
            rows.push(row.clone());
        }
    }
    Ok(DataSet::new(dataset.schema.clone(), rows))
}

/// Hashable view of a [`Value`].
///
/// Floats hash by bit pattern with `-0.0` folded into `0.0` and all NaNs folded together.
#[derive(Debug, PartialEq, Eq, Hash)]
enum KeyAtom<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(&'a str),
    List(Vec<KeyAtom<'a>>),
}

impl<'a> From<&'a Value> for KeyAtom<'a> {
    fn from(v: &'a Value) -> Self {
        match v {
            Value::Null => KeyAtom::Null,
            Value::Bool(b) => KeyAtom::Bool(*b),
            Value::Int64(i) => KeyAtom::Int(*i),
            Value::Float64(f) if f.is_nan() => KeyAtom::Float(f64::NAN.to_bits()),
            Value::Float64(f) if *f == 0.0 => KeyAtom::Float(0f64.to_bits()),
            Value::Float64(f) => KeyAtom::Float(f.to_bits()),
            Value::Utf8(s) => KeyAtom::Str(s),
            Value::List(items) => KeyAtom::List(items.iter().map(KeyAtom::from).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::dedupe;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn orders() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("region", DataType::Utf8),
        ]);
        let rows = vec![
            vec![Value::Int64(5), Value::Utf8("eu".to_string())],
            vec![Value::Int64(6), Value::Null],
            vec![Value::Int64(5), Value::Utf8("us".to_string())],
            vec![Value::Int64(7), Value::Null],
            vec![Value::Int64(6), Value::Null],
        ];
        DataSet::new(schema, rows)
    }

    #[test]
    fn keeps_first_row_per_key() {
        let out = dedupe(&orders(), &["id".to_string()]).unwrap();
        assert_eq!(out.row_count(), 3);
        assert_eq!(out.rows[0], vec![Value::Int64(5), Value::Utf8("eu".to_string())]);
        assert_eq!(out.rows[1][0], Value::Int64(6));
        assert_eq!(out.rows[2][0], Value::Int64(7));
    }

    #[test]
    fn nulls_are_equal_keys() {
        let out = dedupe(&orders(), &["region".to_string()]).unwrap();
        // eu, null, us
        assert_eq!(out.row_count(), 3);
    }

    #[test]
    fn empty_key_list_uses_all_columns() {
        let out = dedupe(&orders(), &[]).unwrap();
        // Only the trailing (6, null) repeats an earlier row.
        assert_eq!(out.row_count(), 4);
    }

    #[test]
    fn unknown_key_column_is_a_configuration_error() {
        let err = dedupe(&orders(), &["nope".to_string()]).unwrap_err();
        assert!(err.to_string().contains("dedup key column 'nope' does not exist"));
    }

    #[test]
    fn negative_zero_equals_zero() {
        let schema = Schema::new(vec![Field::new("x", DataType::Float64)]);
        let ds = DataSet::new(schema, vec![vec![Value::Float64(0.0)], vec![Value::Float64(-0.0)]]);
        assert_eq!(dedupe(&ds, &[]).unwrap().row_count(), 1);
    }
}
