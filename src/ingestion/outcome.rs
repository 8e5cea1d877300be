use std::path::PathBuf;

use crate::error::IngestionError;

use super::observability::{IngestionContext, IngestionSeverity};
use super::unified::{severity_for_error, IngestionFormat};

/// Result of one per-entry stage (enumeration or loading).
///
/// Fatal problems are the `Err` side of the surrounding [`crate::IngestionResult`]; an
/// [`Outcome::Skip`] is a soft failure that drops only the entry it describes.
#[derive(Debug)]
pub enum Outcome<T> {
    /// The stage produced a value for the next stage.
    Ready(T),
    /// The entry is excluded from the rest of the read.
    Skip(SkipNotice),
}

impl<T> Outcome<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Outcome::Ready(v) => Some(v),
            Outcome::Skip(_) => None,
        }
    }
}

/// Why an entry was skipped.
#[derive(Debug)]
pub struct SkipNotice {
    /// Entry path, relative to the directory root or inside the archive.
    pub path: PathBuf,
    /// Format of the entry, if its extension maps to one.
    pub format: Option<IngestionFormat>,
    pub severity: IngestionSeverity,
    pub error: IngestionError,
}

impl SkipNotice {
    /// Build a notice whose severity is derived from `error`.
    pub fn new(path: impl Into<PathBuf>, format: Option<IngestionFormat>, error: IngestionError) -> Self {
        Self {
            path: path.into(),
            format,
            severity: severity_for_error(&error),
            error,
        }
    }

    pub fn context(&self) -> IngestionContext {
        IngestionContext {
            path: self.path.clone(),
            format: self.format,
        }
    }
}
