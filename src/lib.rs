//! `tabular-harvest` reads every tabular file in a directory tree or ZIP archive into named
//! in-memory [`types::DataSet`]s.
//!
//! The primary entrypoint is [`pipeline::read_data`]. A read runs five stages:
//!
//! 1. **Enumerate** the directory (recursively, macOS metadata skipped) or the archive.
//! 2. **Load** entries in parallel, in bounded batches, picking the parser from the file extension.
//! 3. **Group** tables: with `join_similar`, files such as `orders1.csv` and `orders2.csv` whose
//!    columns are equal or nested merge into one table named `orders`.
//! 4. **Deduplicate** configured tables on key columns, keeping the first occurrence.
//! 5. **Filter** configured tables with AND-ed predicates.
//!
//! Files that cannot be loaded are logged via `tracing`, reported to an optional
//! [`ingestion::IngestionObserver`] and left out of the result.
//!
//! ## What you can read
//!
//! - **CSV**: `.csv` (header row required, column types inferred)
//! - **JSON**: `.json` (array of objects, single object, or newline-delimited) and `.ndjson`
//! - **Parquet**: `.parquet`, `.pq`
//! - **Excel/workbooks** (requires the Cargo feature `excel`): `.xlsx`, `.xls`, `.xlsm`, `.xlsb`, `.ods`
//!
//! Logical value types are [`types::DataType::Int64`], [`types::DataType::Float64`],
//! [`types::DataType::Bool`], [`types::DataType::Utf8`] and [`types::DataType::List`].
//! Empty cells and explicit JSON `null` map to [`types::Value::Null`].
//!
//! ## Quick example
//!
//! ```no_run
//! use tabular_harvest::config::ReadConfig;
//! use tabular_harvest::read_data;
//!
//! # fn main() -> Result<(), tabular_harvest::IngestionError> {
//! let options = ReadConfig::from_json_str(
//!     r#"{
//!         "join_similar": true,
//!         "duplicated_subset_dict": {"orders": ["id"]},
//!         "filter_subset": {"orders": [{"column": "amount", "operation": ">", "values": 100}]}
//!     }"#,
//! )?
//! .into_options()?;
//!
//! let tables = read_data("exports.zip", &options)?;
//! println!("orders rows={}", tables["orders"].row_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`pipeline`]: the batch read and its options
//! - [`config`]: serde-loadable configuration
//! - [`ingestion`]: source enumeration and format loaders
//! - [`processing`]: grouping, joining, deduplication and filtering
//! - [`execution`]: the loader worker pool
//! - [`types`]: schema and in-memory dataset types
//! - [`error`]: the crate error type

pub mod config;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod pipeline;
pub mod processing;
pub mod types;

pub use error::{IngestionError, IngestionResult};
pub use pipeline::{read_archive_bytes, read_data, ReadOptions, Tables};
