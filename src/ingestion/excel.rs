#![cfg(feature = "excel")]

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::error::{IngestionError, IngestionResult};
use crate::processing::join;
use crate::types::{DataSet, Value};

use super::infer::{dataset_from_values, validate_headers};
use super::unified::ExcelSheetSelection;

/// Load an Excel document (`.xlsx`, `.xls`, `.ods`, etc.) held in memory into a [`DataSet`].
///
/// Behavior:
/// - Sheets are chosen by `selection`; multiple sheets are concatenated in order, with their
///   columns unioned the same way similar files are joined
/// - The first non-empty row of each sheet is its header row
/// - Cells keep calamine's native kind (int, float, bool, string); dates render as text
pub fn load_excel_from_bytes(bytes: Vec<u8>, selection: &ExcelSheetSelection) -> IngestionResult<DataSet> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let all_sheets = workbook.sheet_names().to_vec();
    let sheets: Vec<String> = match selection {
        ExcelSheetSelection::First => all_sheets.into_iter().take(1).collect(),
        ExcelSheetSelection::Sheet(name) => vec![name.clone()],
        ExcelSheetSelection::AllSheets => all_sheets,
        ExcelSheetSelection::Sheets(names) => names.clone(),
    };
    if sheets.is_empty() {
        return Err(IngestionError::SchemaMismatch {
            message: "workbook has no sheets".to_string(),
        });
    }

    let mut tables = Vec::with_capacity(sheets.len());
    for sheet in &sheets {
        let range = workbook.worksheet_range(sheet)?;
        let table = load_sheet_range(&range).map_err(|e| wrap_schema_err_with_sheet(sheet, e))?;
        tables.push(table);
    }

    join(&tables)
}

fn load_sheet_range(range: &calamine::Range<Data>) -> IngestionResult<DataSet> {
    let mut rows_iter = range
        .rows()
        .skip_while(|row| row.iter().all(|c| matches!(c, Data::Empty)));

    let header: Vec<String> = rows_iter
        .next()
        .ok_or_else(|| IngestionError::SchemaMismatch {
            message: "sheet has no non-empty rows (no header row found)".to_string(),
        })?
        .iter()
        .map(|c| cell_to_header_string(c).trim().to_string())
        .collect();

    // Trailing blank header cells are padding, not columns.
    let width = header.iter().rposition(|h| !h.is_empty()).map_or(0, |i| i + 1);
    let header: Vec<String> = header.into_iter().take(width).collect();
    validate_headers(&header)?;

    let rows: Vec<Vec<Value>> = rows_iter
        .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|row| {
            (0..width)
                .map(|idx| convert_cell(row.get(idx).unwrap_or(&Data::Empty)))
                .collect()
        })
        .collect();

    dataset_from_values(header, rows)
}

fn wrap_schema_err_with_sheet(sheet: &str, err: IngestionError) -> IngestionError {
    match err {
        IngestionError::SchemaMismatch { message } => IngestionError::SchemaMismatch {
            message: format!("sheet '{sheet}': {message}"),
        },
        other => other,
    }
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => (*f as i64).to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn convert_cell(c: &Data) -> Value {
    match c {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(i) => Value::Int64(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::Int64(*f as i64),
        Data::Float(f) => Value::Float64(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) if s.trim().is_empty() => Value::Null,
        Data::String(s) => Value::Utf8(s.clone()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Utf8(s.clone()),
        Data::DateTime(_) => Value::Utf8(c.to_string()),
    }
}
