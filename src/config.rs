//! Serde-loadable read configuration.
//!
//! [`ReadConfig`] is the on-disk form of the caller-facing knobs of a read, typically kept next
//! to the data in a JSON file:
//!
//! ```json
//! {
//!   "join_similar": true,
//!   "duplicated_subset_dict": { "orders": ["id"] },
//!   "filter_subset": {
//!     "orders": [{ "column": "amount", "operation": ">", "values": 100 }]
//!   },
//!   "csv_delimiter": ";",
//!   "num_threads": 4
//! }
//! ```
//!
//! Operators are kept as strings until [`ReadConfig::into_options`], so an unknown operator is
//! reported as [`IngestionError::FilterConfiguration`] rather than as a JSON syntax error.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{IngestionError, IngestionResult};
use crate::pipeline::ReadOptions;
use crate::processing::{Operation, Predicate};
use crate::types::Value;

/// Caller configuration for [`crate::pipeline::read_data`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadConfig {
    /// Merge files with similar names and compatible columns.
    pub join_similar: bool,
    /// Logical name -> dedup key columns.
    pub duplicated_subset_dict: HashMap<String, Vec<String>>,
    /// Logical name -> predicates (AND-ed).
    pub filter_subset: HashMap<String, Vec<PredicateConfig>>,
    /// Single ASCII character separating CSV fields.
    pub csv_delimiter: Option<String>,
    /// Loader thread count.
    pub num_threads: Option<usize>,
}

/// A predicate as written in configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredicateConfig {
    pub column: String,
    pub operation: String,
    #[serde(default = "null_value")]
    pub values: Value,
}

fn null_value() -> Value {
    Value::Null
}

impl ReadConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(input: &str) -> IngestionResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> IngestionResult<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Convert into [`ReadOptions`], validating operators and the CSV delimiter.
    ///
    /// Options that have no configuration counterpart (observer, sheet selection, ...) keep
    /// their defaults.
    pub fn into_options(self) -> IngestionResult<ReadOptions> {
        let mut options = ReadOptions {
            join_similar: self.join_similar,
            duplicated_subset: self.duplicated_subset_dict,
            ..Default::default()
        };

        for (name, predicates) in self.filter_subset {
            let parsed = predicates
                .into_iter()
                .map(|p| -> IngestionResult<Predicate> {
                    let operation = p.operation.parse::<Operation>().map_err(|e| match e {
                        IngestionError::FilterConfiguration { message } => IngestionError::FilterConfiguration {
                            message: format!("filter for '{name}' on column '{}': {message}", p.column),
                        },
                        other => other,
                    })?;
                    Ok(Predicate {
                        column: p.column,
                        operation,
                        values: p.values,
                    })
                })
                .collect::<IngestionResult<Vec<_>>>()?;
            options.filter_subset.insert(name, parsed);
        }

        if let Some(delimiter) = self.csv_delimiter {
            options.load.csv_delimiter = match delimiter.as_bytes() {
                [b] if b.is_ascii() => *b,
                _ => {
                    return Err(IngestionError::InvalidConfig {
                        message: format!("csv_delimiter must be a single ASCII character, got {delimiter:?}"),
                    });
                }
            };
        }
        options.execution.num_threads = self.num_threads;

        Ok(options)
    }
}
