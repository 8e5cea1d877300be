//! Parquet loading.

use std::collections::HashMap;

use bytes::Bytes;
use parquet::file::reader::FileReader;
use parquet::file::serialized_reader::SerializedFileReader;
use parquet::record::Field;

use crate::error::IngestionResult;
use crate::types::{DataSet, Value};

use super::infer::dataset_from_values;

/// Load a Parquet file held in memory into a [`DataSet`].
///
/// Notes:
/// - Columns are the file's top-level fields, in schema order
/// - Uses the Parquet record API (`RowIter`); integer, float, bool, string and list values map
///   to their [`Value`] counterparts, other logical types (dates, decimals, ...) are kept as text
pub fn load_parquet_from_bytes(bytes: Vec<u8>) -> IngestionResult<DataSet> {
    let reader = SerializedFileReader::new(Bytes::from(bytes))?;

    let names: Vec<String> = reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .root_schema()
        .get_fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect();
    let positions: HashMap<&str, usize> = names
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for row_res in reader.get_row_iter(None)? {
        let row = row_res?;
        let mut out_row = vec![Value::Null; names.len()];
        for (name, field) in row.get_column_iter() {
            if let Some(&idx) = positions.get(name.as_str()) {
                out_row[idx] = convert_parquet_field(field);
            }
        }
        rows.push(out_row);
    }

    dataset_from_values(names, rows)
}

fn convert_parquet_field(f: &Field) -> Value {
    match f {
        Field::Null => Value::Null,
        Field::Bool(b) => Value::Bool(*b),
        Field::Byte(v) => Value::Int64(i64::from(*v)),
        Field::Short(v) => Value::Int64(i64::from(*v)),
        Field::Int(v) => Value::Int64(i64::from(*v)),
        Field::Long(v) => Value::Int64(*v),
        Field::UByte(v) => Value::Int64(i64::from(*v)),
        Field::UShort(v) => Value::Int64(i64::from(*v)),
        Field::UInt(v) => Value::Int64(i64::from(*v)),
        Field::ULong(v) => i64::try_from(*v)
            .map(Value::Int64)
            .unwrap_or(Value::Float64(*v as f64)),
        Field::Float(v) => Value::Float64(f64::from(*v)),
        Field::Double(v) => Value::Float64(*v),
        Field::Str(s) => Value::Utf8(s.clone()),
        Field::ListInternal(list) => Value::List(list.elements().iter().map(convert_parquet_field).collect()),
        other => Value::Utf8(other.to_string()),
    }
}
