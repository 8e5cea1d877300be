//! Source enumeration and format loading.
//!
//! A read starts with [`enumerate`] (from [`source`]), which walks a directory or ZIP archive
//! and yields one [`SourceEntry`] per file, and continues with [`load`] (from [`unified`]),
//! which parses an entry's bytes into a [`crate::types::DataSet`].
//!
//! Per-entry problems never abort a batch: both stages report them as [`Outcome::Skip`]
//! values, which the pipeline logs and forwards to an optional [`IngestionObserver`].
//!
//! Format-specific loaders are also available under:
//! - [`csv`]
//! - [`json`]
//! - [`parquet`]
//! - `excel` (cargo feature `excel`)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
mod infer;
pub mod json;
pub mod observability;
pub mod outcome;
pub mod parquet;
pub mod source;
pub mod unified;

pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
};
pub use outcome::{Outcome, SkipNotice};
pub use source::{enumerate, enumerate_archive_bytes, SourceEntries, SourceEntry, SourceKind};
pub use unified::{load, ExcelSheetSelection, IngestionFormat, LoadOptions};
