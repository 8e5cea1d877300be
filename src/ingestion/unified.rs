//! Format dispatch.
//!
//! [`load`] parses the raw bytes of one source entry into an in-memory
//! [`crate::types::DataSet`], choosing the parser from an [`IngestionFormat`] (normally derived from
//! the entry's file extension by [`IngestionFormat::from_extension`]).

use std::error::Error as StdError;
use std::fmt;
use std::path::Path;

use crate::error::{IngestionError, IngestionResult};
use crate::types::DataSet;

use super::observability::IngestionSeverity;
use super::{csv, json, parquet};

/// Supported ingestion formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IngestionFormat {
    /// Comma-separated values.
    Csv,
    /// JSON array-of-objects or NDJSON.
    Json,
    /// Apache Parquet.
    Parquet,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" | "ndjson" => Some(Self::Json),
            "parquet" | "pq" => Some(Self::Parquet),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }

    /// Infer the format of a path from its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|s| s.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for IngestionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Parquet => "parquet",
            Self::Excel => "excel",
        })
    }
}

/// How to choose sheet(s) when loading an Excel workbook.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExcelSheetSelection {
    /// Load the first sheet (default).
    #[default]
    First,
    /// Load a single named sheet.
    Sheet(String),
    /// Load all sheets and concatenate rows.
    AllSheets,
    /// Load only the listed sheets (in order) and concatenate rows.
    Sheets(Vec<String>),
}

/// Parser options applied to every entry of a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Field delimiter for CSV files.
    pub csv_delimiter: u8,
    /// Excel-specific options.
    pub excel_sheet_selection: ExcelSheetSelection,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            csv_delimiter: b',',
            excel_sheet_selection: ExcelSheetSelection::default(),
        }
    }
}

/// Parse `bytes` as `format`.
///
/// Column types are inferred by the format's parser; no further coercion happens here.
/// Returns [`IngestionError::UnsupportedFormat`] when no parser is registered for `format`
/// (Excel without the `excel` feature).
///
/// ```rust
/// use tabular_harvest::ingestion::{load, IngestionFormat, LoadOptions};
/// use tabular_harvest::types::Value;
///
/// let ds = load(b"id,name\n1,Ada\n".to_vec(), IngestionFormat::Csv, &LoadOptions::default()).unwrap();
/// assert_eq!(ds.rows[0][0], Value::Int64(1));
/// ```
pub fn load(bytes: Vec<u8>, format: IngestionFormat, options: &LoadOptions) -> IngestionResult<DataSet> {
    match format {
        IngestionFormat::Csv => csv::load_csv_from_bytes(&bytes, options.csv_delimiter),
        IngestionFormat::Json => json::load_json_from_bytes(&bytes),
        IngestionFormat::Parquet => parquet::load_parquet_from_bytes(bytes),
        IngestionFormat::Excel => load_excel_dispatch(bytes, &options.excel_sheet_selection),
    }
}

fn load_excel_dispatch(bytes: Vec<u8>, sel: &ExcelSheetSelection) -> IngestionResult<DataSet> {
    #[cfg(feature = "excel")]
    {
        super::excel::load_excel_from_bytes(bytes, sel)
    }

    #[cfg(not(feature = "excel"))]
    {
        let _ = (bytes, sel);
        Err(IngestionError::UnsupportedFormat {
            message: "excel ingestion not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}

/// Severity used when an entry fails to enumerate or load.
pub(crate) fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    match e {
        IngestionError::Io(_) | IngestionError::Zip(_) | IngestionError::Walk(_) => IngestionSeverity::Critical,
        IngestionError::Parquet(err) => {
            // Parquet errors often wrap IO, but not always in a structured way.
            if error_chain_contains_io(err) {
                IngestionSeverity::Critical
            } else {
                IngestionSeverity::Error
            }
        }
        IngestionError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        },
        IngestionError::UnsupportedFormat { .. } => IngestionSeverity::Warning,
        _ => IngestionSeverity::Error,
    }
}

fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}
