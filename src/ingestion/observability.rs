//! Per-entry outcome reporting.
//!
//! The pipeline emits `tracing` events for every entry on its own; an [`IngestionObserver`]
//! is for callers that want the outcomes as data (metrics, audit logs, paging on critical
//! failures).

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::IngestionError;

use super::unified::IngestionFormat;

/// How bad a skipped entry is. Ordered, so thresholds can be compared with `>=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    Info,
    /// The entry is not tabular data this crate understands (unknown extension).
    Warning,
    /// The entry was read but could not be parsed.
    Error,
    /// The entry could not be read at all (I/O, archive or walk failure).
    Critical,
}

impl IngestionSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            IngestionSeverity::Info => "info",
            IngestionSeverity::Warning => "warning",
            IngestionSeverity::Error => "error",
            IngestionSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for IngestionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which entry an event is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionContext {
    /// Entry path, relative to the directory root or inside the archive.
    pub path: PathBuf,
    /// `None` when the extension maps to no format.
    pub format: Option<IngestionFormat>,
}

/// Shape of a successfully loaded entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    pub rows: usize,
    pub columns: usize,
}

/// Receives the outcome of every enumerated entry of a read.
///
/// Success events arrive in enumeration order as each load batch finishes; skip events arrive
/// as soon as the pipeline decides to drop an entry.
pub trait IngestionObserver: Send + Sync {
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// The entry was dropped from the result.
    fn on_skip(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// A skip at or above [`crate::ReadOptions::alert_at_or_above`]. Replaces the
    /// [`Self::on_skip`] call for that entry; the default forwards to it.
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_skip(ctx, severity, error)
    }
}

/// Forwards every event to each inner observer, in order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }

    /// Add another observer at the end of the fan-out list.
    pub fn with(mut self, observer: Arc<dyn IngestionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    fn each(&self, f: impl Fn(&dyn IngestionObserver)) {
        self.observers.iter().for_each(|o| f(o.as_ref()));
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.each(|o| o.on_success(ctx, stats));
    }

    fn on_skip(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.each(|o| o.on_skip(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.each(|o| o.on_alert(ctx, severity, error));
    }
}

/// Appends one `key=value` line per event to a log file.
///
/// ```text
/// ts=1760400000 event=ok path=orders1.csv format=csv rows=2 columns=2
/// ts=1760400000 event=skip severity=warning path=notes.xyz format=- error="unsupported format: ..."
/// ```
///
/// The file is opened on the first event and kept open. Logging is best-effort: open and
/// write failures are dropped so an unwritable log never fails a read.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    writer: Mutex<Option<LineWriter<File>>>,
}

impl FileObserver {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            writer: Mutex::new(None),
        }
    }

    fn write_event(&self, event: &str, ctx: &IngestionContext, detail: fmt::Arguments<'_>) {
        let Ok(mut guard) = self.writer.lock() else {
            return;
        };
        if guard.is_none() {
            *guard = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .ok()
                .map(LineWriter::new);
        }
        if let Some(w) = guard.as_mut() {
            let format = ctx.format.map_or("-".to_string(), |f| f.to_string());
            let _ = writeln!(
                w,
                "ts={} event={event} path={} format={format} {detail}",
                unix_ts(),
                ctx.path.display()
            );
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.write_event("ok", ctx, format_args!("rows={} columns={}", stats.rows, stats.columns));
    }

    fn on_skip(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.write_event("skip", ctx, format_args!("severity={severity} error={:?}", error.to_string()));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.write_event("alert", ctx, format_args!("severity={severity} error={:?}", error.to_string()));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::IngestionSeverity;

    #[test]
    fn severities_are_ordered() {
        assert!(IngestionSeverity::Info < IngestionSeverity::Warning);
        assert!(IngestionSeverity::Error < IngestionSeverity::Critical);
        assert_eq!(IngestionSeverity::Critical.to_string(), "critical");
    }
}
