use std::fs;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use tabular_harvest::ingestion::{
    enumerate_archive_bytes, IngestionContext, IngestionObserver, IngestionSeverity, Outcome,
};
use tabular_harvest::types::Value;
use tabular_harvest::{read_archive_bytes, read_data, IngestionError, ReadOptions};

fn tmp_file(name: &str, ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tabular-harvest-{name}-{nanos}.{ext}"))
}

fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, contents) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn sample_archive() -> Vec<u8> {
    zip_bytes(&[
        ("export/orders1.csv", "id,amount\n5,120\n6,80\n"),
        ("export/orders2.csv", "id,amount,region\n5,999,eu\n7,150,us\n"),
        ("export/people.ndjson", "{\"id\":1}\n{\"id\":2}\n"),
        ("export/notes.xyz", "ignored"),
        ("__MACOSX/export/._orders1.csv", "resource fork"),
    ])
}

#[test]
fn read_zip_file_from_path() {
    let path = tmp_file("archive", "zip");
    fs::write(&path, sample_archive()).unwrap();

    let opts = ReadOptions {
        join_similar: true,
        ..Default::default()
    };
    let tables = read_data(&path, &opts).unwrap();
    assert_eq!(tables.keys().map(String::as_str).collect::<Vec<_>>(), vec!["orders", "people"]);
    assert_eq!(tables["orders"].row_count(), 4);
    assert_eq!(tables["people"].rows, vec![vec![Value::Int64(1)], vec![Value::Int64(2)]]);

    let _ = fs::remove_file(&path);
}

#[test]
fn zip_signature_is_detected_without_extension() {
    let path = tmp_file("archive-no-ext", "bin");
    fs::write(&path, sample_archive()).unwrap();

    let tables = read_data(&path, &ReadOptions::default()).unwrap();
    assert_eq!(
        tables.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["orders1", "orders2", "people"]
    );

    let _ = fs::remove_file(&path);
}

#[test]
fn in_memory_archive_matches_on_disk_archive() {
    let path = tmp_file("archive-compare", "zip");
    let bytes = sample_archive();
    fs::write(&path, &bytes).unwrap();

    let opts = ReadOptions {
        join_similar: true,
        ..Default::default()
    };
    assert_eq!(read_archive_bytes(bytes, &opts).unwrap(), read_data(&path, &opts).unwrap());

    let _ = fs::remove_file(&path);
}

#[test]
fn archive_entries_keep_stored_order_and_skip_unknown_extensions() {
    let entries: Vec<_> = enumerate_archive_bytes(sample_archive())
        .unwrap()
        .map(Result::unwrap)
        .collect();

    let described: Vec<String> = entries
        .iter()
        .map(|o| match o {
            Outcome::Ready(e) => format!("ready {}", e.logical_name),
            Outcome::Skip(n) => format!("skip {}", n.path.display()),
        })
        .collect();
    assert_eq!(
        described,
        vec![
            "ready orders1".to_string(),
            "ready orders2".to_string(),
            "ready people".to_string(),
            "skip export/notes.xyz".to_string(),
        ]
    );
}

#[test]
fn corrupt_entry_is_skipped() {
    let bytes = zip_bytes(&[("good.csv", "id\n1\n"), ("bad.json", "{not json")]);
    let tables = read_archive_bytes(bytes, &ReadOptions::default()).unwrap();
    assert_eq!(tables.keys().map(String::as_str).collect::<Vec<_>>(), vec!["good"]);
}

#[test]
fn garbage_bytes_are_a_zip_error() {
    let err = read_archive_bytes(b"PK\x03\x04 truncated".to_vec(), &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, IngestionError::Zip(_)));
}

#[derive(Default)]
struct SkipRecorder {
    skips: Mutex<Vec<(PathBuf, IngestionSeverity)>>,
    alerts: Mutex<Vec<(PathBuf, IngestionSeverity)>>,
}

impl IngestionObserver for SkipRecorder {
    fn on_skip(&self, ctx: &IngestionContext, severity: IngestionSeverity, _error: &IngestionError) {
        self.skips.lock().unwrap().push((ctx.path.clone(), severity));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, _error: &IngestionError) {
        self.alerts.lock().unwrap().push((ctx.path.clone(), severity));
    }
}

#[test]
fn unknown_archive_entry_is_reported_as_a_warning_skip() {
    let recorder = Arc::new(SkipRecorder::default());
    let opts = ReadOptions {
        observer: Some(recorder.clone()),
        ..Default::default()
    };
    let tables = read_archive_bytes(sample_archive(), &opts).unwrap();
    assert_eq!(tables.len(), 3);

    // The __MACOSX companion is dropped without an event.
    assert_eq!(
        *recorder.skips.lock().unwrap(),
        vec![(PathBuf::from("export/notes.xyz"), IngestionSeverity::Warning)]
    );
    assert!(recorder.alerts.lock().unwrap().is_empty());
}
