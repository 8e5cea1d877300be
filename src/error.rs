use std::path::PathBuf;

use thiserror::Error;

use crate::types::DataType;

/// Convenience result type used across the crate.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned by enumeration, loading and the processing stages.
///
/// Per-file variants (I/O, parse, unsupported format) are recoverable inside a batch read:
/// the pipeline logs them and drops the entry. Configuration and structural variants
/// ([`IngestionError::PathKind`], [`IngestionError::SchemaConflict`],
/// [`IngestionError::FilterConfiguration`]) abort [`crate::pipeline::read_data`].
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Excel ingestion error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV ingestion error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Parquet ingestion error.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// JSON ingestion or configuration error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// ZIP archive error.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// The loader worker pool could not be started.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The input path is neither a readable directory nor a supported archive.
    #[error("unsupported source path (expected a directory or a zip archive): {}", path.display())]
    PathKind { path: PathBuf },

    /// A file maps to no known parser, or a whole source contained no loadable files.
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },

    /// The input does not have a usable tabular shape (missing header, mixed column kinds, etc.).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A value could not be read at a specific location.
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// Two tables being joined declare the same column with types that cannot be widened.
    #[error("schema conflict on column '{column}': {left} vs {right}")]
    SchemaConflict {
        column: String,
        left: DataType,
        right: DataType,
    },

    /// A [`crate::config::ReadConfig`] value cannot be turned into read options.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A dedup key or filter predicate is invalid for the table it targets.
    #[error("filter configuration error: {message}")]
    FilterConfiguration { message: String },
}
