use std::sync::Arc;

use parquet::column::writer::ColumnWriter;
use parquet::data_type::ByteArray;
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::parser::parse_message_type;

use tabular_harvest::ingestion::parquet::load_parquet_from_bytes;
use tabular_harvest::types::{DataType, Value};

/// Two rows of `id`, `name`, `score`, `active`; `score` is optional and null in row 2.
fn people_parquet() -> Vec<u8> {
    let schema_str = r#"
    message schema {
      REQUIRED INT64 id;
      REQUIRED BINARY name (UTF8);
      OPTIONAL DOUBLE score;
      REQUIRED BOOLEAN active;
    }
    "#;

    let schema = Arc::new(parse_message_type(schema_str).unwrap());
    let props = Arc::new(WriterProperties::builder().build());
    let mut buf = Vec::new();
    let mut writer = SerializedFileWriter::new(&mut buf, schema, props).unwrap();

    let mut rg = writer.next_row_group().unwrap();
    while let Some(mut col) = rg.next_column().unwrap() {
        match col.untyped() {
            ColumnWriter::Int64ColumnWriter(w) => {
                w.write_batch(&[1_i64, 2_i64], None, None).unwrap();
            }
            ColumnWriter::ByteArrayColumnWriter(w) => {
                let v1 = ByteArray::from("Ada");
                let v2 = ByteArray::from("Grace");
                w.write_batch(&[v1, v2], None, None).unwrap();
            }
            ColumnWriter::DoubleColumnWriter(w) => {
                // Definition level 0 marks the second value as null.
                w.write_batch(&[98.5_f64], Some(&[1, 0]), None).unwrap();
            }
            ColumnWriter::BoolColumnWriter(w) => {
                w.write_batch(&[true, false], None, None).unwrap();
            }
            _ => panic!("unexpected column writer in test"),
        }
        col.close().unwrap();
    }
    rg.close().unwrap();
    writer.close().unwrap();
    buf
}

#[test]
fn load_parquet_happy_path() {
    let ds = load_parquet_from_bytes(people_parquet()).unwrap();

    assert_eq!(ds.row_count(), 2);
    assert_eq!(
        ds.schema.field_names().collect::<Vec<_>>(),
        vec!["id", "name", "score", "active"]
    );
    assert_eq!(ds.rows[0][0], Value::Int64(1));
    assert_eq!(ds.rows[0][1], Value::Utf8("Ada".to_string()));
    assert_eq!(ds.rows[0][2], Value::Float64(98.5));
    assert_eq!(ds.rows[1][3], Value::Bool(false));
}

#[test]
fn optional_values_load_as_null() {
    let ds = load_parquet_from_bytes(people_parquet()).unwrap();
    assert_eq!(ds.schema.field("score").unwrap().data_type, DataType::Float64);
    assert_eq!(ds.rows[1][2], Value::Null);
}

#[test]
fn garbage_bytes_are_a_parquet_error() {
    let err = load_parquet_from_bytes(b"definitely not parquet".to_vec()).unwrap_err();
    assert!(err.to_string().contains("parquet error"));
}
