use tabular_harvest::ingestion::json::{load_json_from_bytes, load_json_from_str};
use tabular_harvest::types::{DataType, Value};

#[test]
fn load_json_array_fixture_flattens_nested_objects() {
    let bytes = std::fs::read("tests/fixtures/people.json").unwrap();
    let ds = load_json_from_bytes(&bytes).unwrap();

    assert_eq!(ds.row_count(), 2);
    assert_eq!(
        ds.schema.field_names().collect::<Vec<_>>(),
        vec!["id", "user.name", "tags", "active"]
    );
    assert_eq!(ds.rows[0][1], Value::Utf8("Ada".to_string()));
    assert_eq!(ds.rows[1][1], Value::Utf8("Grace".to_string()));
}

#[test]
fn arrays_become_list_cells_and_missing_keys_are_null() {
    let bytes = std::fs::read("tests/fixtures/people.json").unwrap();
    let ds = load_json_from_bytes(&bytes).unwrap();

    assert_eq!(ds.schema.field("tags").unwrap().data_type, DataType::List);
    assert_eq!(ds.rows[0][2], Value::from(vec!["math", "code"]));
    assert_eq!(ds.rows[1][2], Value::Null);
    assert_eq!(ds.rows[0][3], Value::Null);
    assert_eq!(ds.rows[1][3], Value::Bool(false));
}

#[test]
fn load_ndjson() {
    let input = r#"
{"id":1,"user":{"name":"Ada"},"score":98.5}
{"id":2,"user":{"name":"Grace"},"score":87}
"#;
    let ds = load_json_from_str(input).unwrap();
    assert_eq!(ds.row_count(), 2);
    assert_eq!(ds.schema.field("score").unwrap().data_type, DataType::Float64);
    assert_eq!(ds.rows[1][2], Value::Float64(87.0));
}

#[test]
fn single_object_is_one_row() {
    let ds = load_json_from_str(r#"{"id": 7}"#).unwrap();
    assert_eq!(ds.rows, vec![vec![Value::Int64(7)]]);
}

#[test]
fn non_object_rows_are_rejected() {
    let err = load_json_from_str("[1, 2]").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("schema mismatch"));
    assert!(msg.contains("row 1 is not a json object"));
}

#[test]
fn mixed_kinds_in_one_key_are_rejected() {
    let err = load_json_from_str(r#"[{"id": 1}, {"id": "one"}]"#).unwrap_err();
    assert!(err.to_string().contains("column 'id' mixes int64 and utf8 values"));
}
