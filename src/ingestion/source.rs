//! Source enumeration.
//!
//! [`enumerate`] turns a directory tree or a ZIP archive into a lazy sequence of
//! [`SourceEntry`] values. Entries are produced in a deterministic order (file-name order for
//! directories, stored order for archives) since similarity grouping depends on it.

use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, FilterEntry, WalkDir};
use zip::ZipArchive;

use crate::error::{IngestionError, IngestionResult};

use super::outcome::{Outcome, SkipNotice};
use super::unified::IngestionFormat;

/// One file discovered in a source, with its contents read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Dataset identity: the file's base name without extension.
    pub logical_name: String,
    /// Path relative to the directory root or inside the archive.
    pub path: PathBuf,
    /// Raw file contents.
    pub bytes: Vec<u8>,
    /// Format inferred from the file extension.
    pub format: IngestionFormat,
}

/// What kind of source a path points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Directory,
    Archive,
}

impl SourceKind {
    /// Classify `path`.
    ///
    /// Directories are [`SourceKind::Directory`]. Regular files are archives when they carry a
    /// `.zip` extension or, failing that, start with a ZIP signature. Anything else is
    /// [`IngestionError::PathKind`].
    pub fn detect(path: &Path) -> IngestionResult<Self> {
        let path_kind = || IngestionError::PathKind {
            path: path.to_path_buf(),
        };
        let meta = fs::metadata(path).map_err(|_| path_kind())?;
        if meta.is_dir() {
            return Ok(Self::Directory);
        }
        if meta.is_file() {
            let zip_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("zip"));
            if zip_ext || has_zip_signature(path)? {
                return Ok(Self::Archive);
            }
        }
        Err(path_kind())
    }
}

const ZIP_SIGNATURES: [[u8; 4]; 3] = [*b"PK\x03\x04", *b"PK\x05\x06", *b"PK\x07\x08"];

fn has_zip_signature(path: &Path) -> IngestionResult<bool> {
    let mut head = [0u8; 4];
    let mut f = File::open(path)?;
    let n = f.read(&mut head)?;
    Ok(n == head.len() && ZIP_SIGNATURES.contains(&head))
}

/// Enumerate the entries of a directory or ZIP archive.
///
/// A file that passes [`SourceKind::detect`] but cannot be opened as a ZIP archive (a corrupt
/// `.zip`) is reported as [`IngestionError::PathKind`], like any other unusable source path.
///
/// ```no_run
/// use tabular_harvest::ingestion::enumerate;
///
/// # fn main() -> Result<(), tabular_harvest::IngestionError> {
/// for outcome in enumerate("exports/")? {
///     if let Some(entry) = outcome?.ready() {
///         println!("{} <- {}", entry.logical_name, entry.path.display());
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn enumerate(path: impl AsRef<Path>) -> IngestionResult<SourceEntries> {
    let path = path.as_ref();
    match SourceKind::detect(path)? {
        SourceKind::Directory => Ok(SourceEntries::directory(path)),
        SourceKind::Archive => {
            SourceEntries::archive(ArchiveReader::File(File::open(path)?)).map_err(|e| match e {
                IngestionError::Zip(_) => IngestionError::PathKind {
                    path: path.to_path_buf(),
                },
                other => other,
            })
        }
    }
}

/// Enumerate a ZIP archive held in memory.
///
/// Bytes that are not a readable archive are an [`IngestionError::Zip`].
pub fn enumerate_archive_bytes(bytes: Vec<u8>) -> IngestionResult<SourceEntries> {
    SourceEntries::archive(ArchiveReader::Memory(Cursor::new(bytes)))
}

/// Lazy, finite sequence of discovered entries.
///
/// Each item is either a [`SourceEntry`] or a [`SkipNotice`] describing a file that cannot be
/// loaded (unknown extension, unreadable entry). Re-run [`enumerate`] to scan again.
pub struct SourceEntries {
    inner: Inner,
}

type VisibleWalk = FilterEntry<walkdir::IntoIter, fn(&DirEntry) -> bool>;

enum Inner {
    Directory { root: PathBuf, walk: VisibleWalk },
    Archive { archive: ZipArchive<ArchiveReader>, next: usize },
}

impl SourceEntries {
    fn directory(root: &Path) -> Self {
        let walk = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(is_visible as fn(&DirEntry) -> bool);
        Self {
            inner: Inner::Directory {
                root: root.to_path_buf(),
                walk,
            },
        }
    }

    fn archive(reader: ArchiveReader) -> IngestionResult<Self> {
        Ok(Self {
            inner: Inner::Archive {
                archive: ZipArchive::new(reader)?,
                next: 0,
            },
        })
    }
}

impl Iterator for SourceEntries {
    type Item = IngestionResult<Outcome<SourceEntry>>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            Inner::Directory { root, walk } => next_directory_entry(root, walk),
            Inner::Archive { archive, next } => next_archive_entry(archive, next),
        }
    }
}

fn next_directory_entry(root: &Path, walk: &mut VisibleWalk) -> Option<IngestionResult<Outcome<SourceEntry>>> {
    loop {
        let entry = match walk.next()? {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .map(|p| relative_to(root, p))
                    .unwrap_or_else(|| root.to_path_buf());
                return Some(Ok(Outcome::Skip(SkipNotice::new(path, None, e.into()))));
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = relative_to(root, entry.path());
        let outcome = classify(rel, || fs::read(entry.path()));
        return Some(Ok(outcome));
    }
}

fn next_archive_entry(
    archive: &mut ZipArchive<ArchiveReader>,
    next: &mut usize,
) -> Option<IngestionResult<Outcome<SourceEntry>>> {
    while *next < archive.len() {
        let idx = *next;
        *next += 1;

        let mut file = match archive.by_index(idx) {
            Ok(file) => file,
            Err(e) => {
                let path = PathBuf::from(format!("<archive entry {idx}>"));
                return Some(Ok(Outcome::Skip(SkipNotice::new(path, None, e.into()))));
            }
        };
        if file.is_dir() {
            continue;
        }
        let path = PathBuf::from(file.name());
        if path.components().any(|c| is_os_metadata(&c.as_os_str().to_string_lossy())) {
            continue;
        }

        let size_hint = usize::try_from(file.size()).unwrap_or(0);
        return Some(Ok(classify(path, || {
            let mut buf = Vec::with_capacity(size_hint);
            file.read_to_end(&mut buf)?;
            Ok(buf)
        })));
    }
    None
}

/// Resolve the format of `path` and read it, turning every per-file problem into a skip.
fn classify(path: PathBuf, read: impl FnOnce() -> io::Result<Vec<u8>>) -> Outcome<SourceEntry> {
    let Some(format) = IngestionFormat::from_path(&path) else {
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_else(|| "<none>".to_string());
        let error = IngestionError::UnsupportedFormat {
            message: format!("unsupported file extension '{ext}' for {}", path.display()),
        };
        return Outcome::Skip(SkipNotice::new(path, None, error));
    };

    match read() {
        Ok(bytes) => Outcome::Ready(SourceEntry {
            logical_name: logical_name(&path),
            path,
            bytes,
            format,
        }),
        Err(e) => Outcome::Skip(SkipNotice::new(path, Some(format), e.into())),
    }
}

/// Base file name without its extension.
pub fn logical_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

fn is_visible(entry: &DirEntry) -> bool {
    entry.depth() == 0 || !is_os_metadata(&entry.file_name().to_string_lossy())
}

/// macOS archive metadata: the `__MACOSX` folder and AppleDouble `._name` companions.
///
/// Other dotfiles are ordinary entries and go through [`classify`].
fn is_os_metadata(name: &str) -> bool {
    name == "__MACOSX" || name.starts_with("._")
}

/// Seekable byte source backing a [`ZipArchive`].
enum ArchiveReader {
    File(File),
    Memory(Cursor<Vec<u8>>),
}

impl Read for ArchiveReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ArchiveReader::File(f) => f.read(buf),
            ArchiveReader::Memory(c) => c.read(buf),
        }
    }
}

impl Seek for ArchiveReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            ArchiveReader::File(f) => f.seek(pos),
            ArchiveReader::Memory(c) => c.seek(pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{classify, is_os_metadata, logical_name};
    use crate::ingestion::{IngestionFormat, IngestionSeverity, Outcome};

    #[test]
    fn logical_name_drops_directory_and_extension() {
        assert_eq!(logical_name(Path::new("2024/orders1.csv")), "orders1");
        assert_eq!(logical_name(Path::new("people")), "people");
    }

    #[test]
    fn only_macos_metadata_is_filtered() {
        assert!(is_os_metadata("__MACOSX"));
        assert!(is_os_metadata("._orders.csv"));
        assert!(!is_os_metadata(".backup_orders.csv"));
        assert!(!is_os_metadata(".data"));
        assert!(!is_os_metadata("orders.csv"));
    }

    #[test]
    fn unknown_extension_is_a_warning_skip() {
        let outcome = classify("notes.xyz".into(), || Ok(Vec::new()));
        match outcome {
            Outcome::Skip(notice) => {
                assert_eq!(notice.severity, IngestionSeverity::Warning);
                assert!(notice.error.to_string().contains("'.xyz'"));
            }
            Outcome::Ready(_) => panic!("expected a skip"),
        }
    }

    #[test]
    fn read_failures_are_critical_skips() {
        let outcome = classify("orders.csv".into(), || {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"))
        });
        match outcome {
            Outcome::Skip(notice) => {
                assert_eq!(notice.format, Some(IngestionFormat::Csv));
                assert_eq!(notice.severity, IngestionSeverity::Critical);
            }
            Outcome::Ready(_) => panic!("expected a skip"),
        }
    }
}
