//! In-memory table transformations used by the read pipeline.
//!
//! Every function takes its input by reference and returns a new [`crate::types::DataSet`].
//!
//! - [`group()`]: similarity grouping of loaded tables
//! - [`join()`]: concatenation with column union
//! - [`dedupe()`]: first-occurrence deduplication on key columns
//! - [`filter()`]: predicate evaluation (`==`, `!=`, `>`, `>=`, `<`, `<=`, `in`, `notin`,
//!   `contains`)
//!
//! ## Example: join → dedupe → filter
//!
//! ```rust
//! use tabular_harvest::processing::{dedupe, filter, join, Operation, Predicate};
//! use tabular_harvest::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let first = DataSet::new(
//!     Schema::new(vec![Field::new("id", DataType::Int64), Field::new("amount", DataType::Int64)]),
//!     vec![
//!         vec![Value::Int64(5), Value::Int64(120)],
//!         vec![Value::Int64(6), Value::Int64(80)],
//!     ],
//! );
//! let second = DataSet::new(
//!     Schema::new(vec![Field::new("id", DataType::Int64), Field::new("amount", DataType::Int64)]),
//!     vec![vec![Value::Int64(5), Value::Int64(999)]],
//! );
//!
//! let joined = join(&[first, second]).unwrap();
//! let unique = dedupe(&joined, &["id".to_string()]).unwrap();
//! let large = filter(&unique, &[Predicate::new("amount", Operation::Gt, 100)]).unwrap();
//! assert_eq!(large.rows, vec![vec![Value::Int64(5), Value::Int64(120)]]);
//! ```

pub mod dedupe;
pub mod filter;
pub mod group;
pub mod join;

pub use dedupe::dedupe;
pub use filter::{filter, Operation, Predicate};
pub use group::{group, similar_name, NamedTable, SimilarityGroup};
pub use join::join;
