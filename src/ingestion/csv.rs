//! CSV loading.

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

use super::infer::validate_headers;

/// Load CSV bytes into an in-memory [`DataSet`].
///
/// Rules:
///
/// - CSV must have a header row; header names must be unique and non-empty.
/// - Each column's type is inferred from its non-empty cells, trying `Int64`, then `Float64`,
///   then `Bool` (`true`/`false`, case-insensitive), falling back to `Utf8`.
/// - Empty (or whitespace-only) cells are [`Value::Null`].
pub fn load_csv_from_bytes(bytes: &[u8], delimiter: u8) -> IngestionResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_reader(bytes);
    load_csv_from_reader(&mut rdr)
}

/// Load CSV data from an existing CSV reader.
pub fn load_csv_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> IngestionResult<DataSet> {
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if headers.is_empty() {
        return Err(IngestionError::SchemaMismatch {
            message: "csv input has no header row".to_string(),
        });
    }
    validate_headers(&headers)?;

    let mut raw_rows: Vec<csv::StringRecord> = Vec::new();
    for result in rdr.records() {
        raw_rows.push(result?);
    }

    let types: Vec<DataType> = (0..headers.len())
        .map(|idx| infer_text_column(raw_rows.iter().map(|r| r.get(idx).unwrap_or(""))))
        .collect();

    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(raw_rows.len());
    for (row_idx0, record) in raw_rows.iter().enumerate() {
        // 1-based row number for users; +1 again because header is row 1.
        let user_row = row_idx0 + 2;
        let mut row = Vec::with_capacity(headers.len());
        for (idx, data_type) in types.iter().enumerate() {
            let raw = record.get(idx).unwrap_or("");
            row.push(parse_typed_value(user_row, &headers[idx], *data_type, raw)?);
        }
        rows.push(row);
    }

    let schema = Schema::new(
        headers
            .into_iter()
            .zip(types)
            .map(|(name, data_type)| Field::new(name, data_type))
            .collect(),
    );
    Ok(DataSet::new(schema, rows))
}

fn infer_text_column<'a>(cells: impl Iterator<Item = &'a str>) -> DataType {
    let mut inferred = DataType::Null;
    for cell in cells {
        let cell = cell.trim();
        if cell.is_empty() {
            continue;
        }
        let kind = if cell.parse::<i64>().is_ok() {
            DataType::Int64
        } else if cell.parse::<f64>().is_ok() {
            DataType::Float64
        } else if parse_bool(cell).is_some() {
            DataType::Bool
        } else {
            return DataType::Utf8;
        };
        inferred = match inferred.widen(kind) {
            Some(t) => t,
            None => return DataType::Utf8,
        };
    }
    inferred
}

fn parse_typed_value(row: usize, column: &str, data_type: DataType, raw: &str) -> IngestionResult<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }

    let parsed = match data_type {
        DataType::Null => Some(Value::Null),
        DataType::Utf8 | DataType::List => Some(Value::Utf8(trimmed.to_owned())),
        DataType::Int64 => trimmed.parse::<i64>().ok().map(Value::Int64),
        DataType::Float64 => trimmed.parse::<f64>().ok().map(Value::Float64),
        DataType::Bool => parse_bool(trimmed).map(Value::Bool),
    };
    parsed.ok_or_else(|| IngestionError::ParseError {
        row,
        column: column.to_owned(),
        raw: raw.to_owned(),
        message: format!("expected {data_type}"),
    })
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::infer_text_column;
    use crate::types::DataType;

    #[test]
    fn infers_narrowest_type() {
        assert_eq!(infer_text_column(["1", "", "3"].into_iter()), DataType::Int64);
        assert_eq!(infer_text_column(["1", "2.5"].into_iter()), DataType::Float64);
        assert_eq!(infer_text_column(["TRUE", "false"].into_iter()), DataType::Bool);
        assert_eq!(infer_text_column(["1", "true"].into_iter()), DataType::Utf8);
        assert_eq!(infer_text_column(["", " "].into_iter()), DataType::Null);
    }
}
