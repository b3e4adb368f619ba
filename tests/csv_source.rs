mod common;

use dynrow::{FieldType, MapError, RawValue, Value, query_with_schema, source::CsvSource};

use common::TestWorkspace;

#[test]
fn csv_headers_drive_nested_records() {
    let workspace = TestWorkspace::new();
    let input = workspace.write(
        "facilities.csv",
        "id,rating,open,owner.name,owner.since\n\
         1,4.5,true,Ada,2019\n\
         2,,false,Lin,unknown\n",
    );
    let mut source = CsvSource::new();

    let (schema, records) =
        query_with_schema(&mut source, input.to_str().unwrap(), &[]).expect("mapping succeeds");

    assert_eq!(schema.field_type("rating"), Some(FieldType::Float));
    assert_eq!(schema.field_type("owner.since"), Some(FieldType::Integer));
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get_string("owner.name"), "Ada");
    assert_eq!(records[0].get_int("owner.since"), 2019);
    assert_eq!(records[1].get("rating"), Some(&Value::Null));
    assert_eq!(records[1].get_float("rating"), 0.0);
    assert_eq!(records[1].get_string("owner.since"), "unknown");
    assert_eq!(records[1].get_int("owner.since"), 0);
}

#[test]
fn tsv_extension_selects_tab_delimiter() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("scores.tsv", "player\tscore\nkim\t12\n");
    let mut source = CsvSource::new();

    let (_, records) =
        query_with_schema(&mut source, input.to_str().unwrap(), &[]).expect("mapping succeeds");

    assert_eq!(records[0].get_string("player"), "kim");
    assert_eq!(records[0].get_int("score"), 12);
}

#[test]
fn legacy_encoding_is_decoded_before_inference() {
    let workspace = TestWorkspace::new();
    let path = workspace.path().join("latin.csv");
    // "city,pop\nMünchen,1500000\n" in windows-1252
    let mut bytes = b"city,pop\nM".to_vec();
    bytes.push(0xFC);
    bytes.extend_from_slice(b"nchen,1500000\n");
    std::fs::write(&path, bytes).expect("write latin file");
    let mut source = CsvSource::new().with_encoding(encoding_rs::WINDOWS_1252);

    let (_, records) =
        query_with_schema(&mut source, path.to_str().unwrap(), &[]).expect("mapping succeeds");

    assert_eq!(records[0].get_string("city"), "München");
    assert_eq!(records[0].get_int("pop"), 1_500_000);
}

#[test]
fn parameters_are_rejected_as_query_errors() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("one.csv", "id\n1\n");
    let mut source = CsvSource::new();

    let err = query_with_schema(&mut source, input.to_str().unwrap(), &[RawValue::Integer(1)])
        .expect_err("parameters are not supported");

    assert!(matches!(err, MapError::Query { .. }));
}

#[test]
fn ragged_rows_fail_with_row_number() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("ragged.csv", "a,b\n1,2\n3\n");
    let mut source = CsvSource::new();

    let err = query_with_schema(&mut source, input.to_str().unwrap(), &[])
        .expect_err("ragged row fails");

    assert!(matches!(err, MapError::Row { row: 2, .. }));
}
