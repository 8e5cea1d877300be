//! The batch read: enumerate → load → group → join → dedupe → filter.
//!
//! Per-file failures (unknown extension, unreadable entry, parse error) are soft: the entry is
//! logged, reported to the configured observer and dropped. Structural failures (bad source
//! path, schema conflict inside a group, invalid dedup/filter configuration) abort the read.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::{IngestionError, IngestionResult};
use crate::execution::{ExecutionEngine, ExecutionOptions};
use crate::ingestion::{
    enumerate, enumerate_archive_bytes, load, IngestionContext, IngestionFormat, IngestionObserver,
    IngestionSeverity, IngestionStats, LoadOptions, Outcome, SkipNotice, SourceEntries, SourceEntry,
};
use crate::processing::{dedupe, filter, group, join, NamedTable, Predicate};
use crate::types::DataSet;

/// Result of a read: unique logical name -> table, iterated in key order.
pub type Tables = BTreeMap<String, DataSet>;

/// Phase of a read, used as a structured field in log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Enumerating,
    Loading,
    Grouping,
    Joining,
    Deduping,
    Filtering,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Enumerating => "enumerating",
            Stage::Loading => "loading",
            Stage::Grouping => "grouping",
            Stage::Joining => "joining",
            Stage::Deduping => "deduping",
            Stage::Filtering => "filtering",
            Stage::Done => "done",
        })
    }
}

/// Options for [`read_data`] and [`read_archive_bytes`].
#[derive(Clone)]
pub struct ReadOptions {
    /// Merge files with similar names and compatible columns into one table.
    pub join_similar: bool,
    /// Logical name -> dedup key columns (empty list = all columns).
    pub duplicated_subset: HashMap<String, Vec<String>>,
    /// Logical name -> predicates, AND-ed together.
    pub filter_subset: HashMap<String, Vec<Predicate>>,
    /// Parser options applied to every entry.
    pub load: LoadOptions,
    /// Loader pool sizing.
    pub execution: ExecutionOptions,
    /// Optional observer for per-entry outcomes.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Skips with severity `>=` this value go to [`IngestionObserver::on_alert`].
    pub alert_at_or_above: IngestionSeverity,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            join_similar: false,
            duplicated_subset: HashMap::new(),
            filter_subset: HashMap::new(),
            load: LoadOptions::default(),
            execution: ExecutionOptions::default(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

impl fmt::Debug for ReadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOptions")
            .field("join_similar", &self.join_similar)
            .field("duplicated_subset", &self.duplicated_subset)
            .field("filter_subset", &self.filter_subset)
            .field("load", &self.load)
            .field("execution", &self.execution)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

/// Read every supported file under a directory, or inside a ZIP archive, into named tables.
///
/// ```no_run
/// use tabular_harvest::pipeline::{read_data, ReadOptions};
///
/// # fn main() -> Result<(), tabular_harvest::IngestionError> {
/// let opts = ReadOptions { join_similar: true, ..Default::default() };
/// for (name, table) in read_data("exports/", &opts)? {
///     println!("{name}: {} rows", table.row_count());
/// }
/// # Ok(())
/// # }
/// ```
///
/// Returns [`IngestionError::PathKind`] when `path` is neither (including a corrupt `.zip`),
/// [`IngestionError::UnsupportedFormat`] when no file could be loaded, and
/// [`IngestionError::FilterConfiguration`] when a dedup or filter entry names a table that was
/// not read or is invalid for it.
///
/// Entries are loaded in batches of a few files per worker thread (flushed early once the
/// buffered raw bytes reach 256 MiB), so raw file contents are held only for the batch being
/// parsed. Every parsed table stays in memory until the result is returned.
pub fn read_data(path: impl AsRef<Path>, options: &ReadOptions) -> IngestionResult<Tables> {
    let path = path.as_ref();
    info!(stage = %Stage::Enumerating, source = %path.display(), "starting read");
    let entries = enumerate(path)?;
    run(entries, &path.display().to_string(), options)
}

/// Like [`read_data`] for a ZIP archive already held in memory.
pub fn read_archive_bytes(bytes: Vec<u8>, options: &ReadOptions) -> IngestionResult<Tables> {
    info!(stage = %Stage::Enumerating, bytes = bytes.len(), "starting in-memory archive read");
    let entries = enumerate_archive_bytes(bytes)?;
    run(entries, "<in-memory archive>", options)
}

/// Raw bytes buffered before a load batch is flushed to the pool.
const BATCH_BYTES: usize = 256 * 1024 * 1024;
/// Entries buffered per worker thread before a load batch is flushed.
const BATCH_ENTRIES_PER_THREAD: usize = 4;

fn run(entries: SourceEntries, source: &str, options: &ReadOptions) -> IngestionResult<Tables> {
    let engine = ExecutionEngine::new(&options.execution)?;
    let batch_len = engine.num_threads() * BATCH_ENTRIES_PER_THREAD;
    info!(stage = %Stage::Loading, threads = engine.num_threads(), batch_len, "loading files");

    let mut loaded = Vec::new();
    let mut batch = Vec::with_capacity(batch_len);
    let mut batch_bytes = 0;
    for item in entries {
        match item? {
            Outcome::Ready(entry) => {
                batch_bytes += entry.bytes.len();
                batch.push(entry);
                if batch.len() >= batch_len || batch_bytes >= BATCH_BYTES {
                    load_batch(&engine, std::mem::take(&mut batch), options, &mut loaded);
                    batch_bytes = 0;
                }
            }
            Outcome::Skip(notice) => report_skip(options, &notice),
        }
    }
    if !batch.is_empty() {
        load_batch(&engine, batch, options, &mut loaded);
    }
    debug!(stage = %Stage::Loading, tables = loaded.len(), "loading finished");

    if loaded.is_empty() {
        return Err(IngestionError::UnsupportedFormat {
            message: format!("no loadable files found in {source}"),
        });
    }

    let groups = group(loaded, options.join_similar);
    info!(stage = %Stage::Grouping, groups = groups.len(), join_similar = options.join_similar, "grouped tables");

    let mut tables = Tables::new();
    for g in groups {
        let table = if g.tables.len() == 1 {
            g.tables.into_iter().next().unwrap_or_default()
        } else {
            debug!(stage = %Stage::Joining, table = %g.name, members = g.tables.len(), "joining similar files");
            join(&g.tables).inspect_err(|e| {
                error!(stage = %Stage::Joining, table = %g.name, error = %e, "cannot join similar files");
            })?
        };
        tables.insert(g.name, table);
    }

    apply_dedupe(&mut tables, &options.duplicated_subset)?;
    apply_filter(&mut tables, &options.filter_subset)?;

    info!(stage = %Stage::Done, tables = tables.len(), "read finished");
    Ok(tables)
}

/// Load one batch in parallel and append the results to `loaded` in batch order.
fn load_batch(engine: &ExecutionEngine, batch: Vec<SourceEntry>, options: &ReadOptions, loaded: &mut Vec<NamedTable>) {
    let load_opts = &options.load;
    let results = engine.map_ordered(batch, |entry| {
        let SourceEntry {
            logical_name,
            path,
            bytes,
            format,
        } = entry;
        let result = load(bytes, format, load_opts);
        (logical_name, path, format, result)
    });

    for (name, path, format, result) in results {
        match result {
            Ok(table) => {
                report_success(options, path, format, &table);
                loaded.push(NamedTable::new(name, table));
            }
            Err(e) => report_skip(options, &SkipNotice::new(path, Some(format), e)),
        }
    }
}

fn apply_dedupe(tables: &mut Tables, subsets: &HashMap<String, Vec<String>>) -> IngestionResult<()> {
    let mut names: Vec<&String> = subsets.keys().collect();
    names.sort();
    for name in names {
        let Some(table) = tables.get_mut(name) else {
            error!(stage = %Stage::Deduping, table = %name, "dedup configured for a table that was not read");
            return Err(missing_table(name, tables));
        };
        let before = table.row_count();
        *table = dedupe(table, &subsets[name]).map_err(|e| in_table(name, e))?;
        debug!(stage = %Stage::Deduping, table = %name, before, after = table.row_count(), "deduplicated");
    }
    Ok(())
}

fn apply_filter(tables: &mut Tables, subsets: &HashMap<String, Vec<Predicate>>) -> IngestionResult<()> {
    let mut names: Vec<&String> = subsets.keys().collect();
    names.sort();
    for name in names {
        let Some(table) = tables.get_mut(name) else {
            error!(stage = %Stage::Filtering, table = %name, "filter configured for a table that was not read");
            return Err(missing_table(name, tables));
        };
        let before = table.row_count();
        *table = filter(table, &subsets[name]).map_err(|e| in_table(name, e))?;
        debug!(stage = %Stage::Filtering, table = %name, before, after = table.row_count(), "filtered");
    }
    Ok(())
}

fn missing_table(name: &str, tables: &Tables) -> IngestionError {
    IngestionError::FilterConfiguration {
        message: format!(
            "table '{name}' was not read; tables={:?}",
            tables.keys().collect::<Vec<_>>()
        ),
    }
}

fn in_table(name: &str, e: IngestionError) -> IngestionError {
    match e {
        IngestionError::FilterConfiguration { message } => IngestionError::FilterConfiguration {
            message: format!("table '{name}': {message}"),
        },
        other => other,
    }
}

fn report_success(options: &ReadOptions, path: PathBuf, format: IngestionFormat, table: &DataSet) {
    let stats = IngestionStats {
        rows: table.row_count(),
        columns: table.schema.fields.len(),
    };
    debug!(stage = %Stage::Loading, path = %path.display(), format = %format, rows = stats.rows, columns = stats.columns, "loaded");
    if let Some(obs) = &options.observer {
        let ctx = IngestionContext {
            path,
            format: Some(format),
        };
        obs.on_success(&ctx, stats);
    }
}

fn report_skip(options: &ReadOptions, notice: &SkipNotice) {
    warn!(
        path = %notice.path.display(),
        severity = %notice.severity,
        error = %notice.error,
        "skipping file"
    );
    if let Some(obs) = &options.observer {
        let ctx = notice.context();
        if notice.severity >= options.alert_at_or_above {
            obs.on_alert(&ctx, notice.severity, &notice.error);
        } else {
            obs.on_skip(&ctx, notice.severity, &notice.error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{in_table, missing_table, ReadOptions, Stage, Tables};
    use crate::ingestion::IngestionSeverity;
    use crate::IngestionError;

    #[test]
    fn defaults_alert_only_on_critical() {
        let opts = ReadOptions::default();
        assert_eq!(opts.alert_at_or_above, IngestionSeverity::Critical);
        assert!(!opts.join_similar);
        assert!(format!("{opts:?}").contains("observer_set: false"));
    }

    #[test]
    fn configuration_errors_name_the_table() {
        let e = in_table(
            "orders",
            IngestionError::FilterConfiguration {
                message: "bad".to_string(),
            },
        );
        assert_eq!(e.to_string(), "filter configuration error: table 'orders': bad");
    }

    #[test]
    fn missing_table_lists_the_tables_that_were_read() {
        let mut tables = Tables::new();
        tables.insert("orders".to_string(), Default::default());
        let e = missing_table("order", &tables);
        assert!(matches!(e, IngestionError::FilterConfiguration { .. }));
        assert_eq!(
            e.to_string(),
            r#"filter configuration error: table 'order' was not read; tables=["orders"]"#
        );
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Deduping.to_string(), "deduping");
    }
}
