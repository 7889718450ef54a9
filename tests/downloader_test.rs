use chrono::NaiveDate;
use data_sweeper::downloader::{CSV_MIME, ConversionTarget, XLSX_MIME, convert, to_csv};
use data_sweeper::frame::{Frame, Value};
use data_sweeper::loader::load_frame;
use pretty_assertions::assert_eq;

#[test]
fn csv_round_trip_is_byte_identical_for_plain_data() {
    let input = "id,name,score,active\n1,ann,9.5,True\n2,\"Smith, J\",,False\n3,cy,7,True\n";

    let frame = load_frame("scores.csv", input.as_bytes()).unwrap();
    let output = to_csv(&frame).unwrap();

    assert_eq!(String::from_utf8(output).unwrap(), input);
}

#[test]
fn csv_output_has_no_index_column() {
    let frame = Frame::from_rows(vec!["x".to_string()], vec![vec![Value::Number(4.0)]]);
    assert_eq!(to_csv(&frame).unwrap(), b"x\n4\n");
}

#[test]
fn filled_means_are_written_with_fraction() {
    let frame = Frame::from_rows(vec!["m".to_string()], vec![vec![Value::Number(2.0 / 3.0)]]);
    let csv = String::from_utf8(to_csv(&frame).unwrap()).unwrap();
    assert_eq!(csv, format!("m\n{}\n", 2.0f64 / 3.0));
}

#[test]
fn convert_to_csv_swaps_extension_and_mime() {
    let frame = load_frame("book.csv", b"a\n1\n").unwrap();

    let converted = convert(&frame, "Quarterly.XLSX", ConversionTarget::Csv).unwrap();

    assert_eq!(converted.file_name, "Quarterly.csv");
    assert_eq!(converted.mime_type, CSV_MIME);
    assert_eq!(converted.bytes, b"a\n1\n");
}

#[test]
fn convert_to_excel_produces_a_zip_container() {
    let frame = load_frame("book.csv", b"a,b\n1,x\n").unwrap();

    let converted = convert(&frame, "book.csv", ConversionTarget::Excel).unwrap();

    assert_eq!(converted.file_name, "book.xlsx");
    assert_eq!(converted.mime_type, XLSX_MIME);
    // XLSX files are zip archives
    assert_eq!(&converted.bytes[..2], b"PK");
}

#[test]
fn csv_to_excel_and_back_preserves_values() {
    let input = b"region,units,ok\nnorth,12,True\nsouth,,False\n";
    let frame = load_frame("sales.csv", input).unwrap();

    let xlsx = convert(&frame, "sales.csv", ConversionTarget::Excel).unwrap();
    let reloaded = load_frame(&xlsx.file_name, &xlsx.bytes).unwrap();

    // spreadsheets store every number as a float
    assert_eq!(reloaded.column("units").unwrap().values, vec![Value::Number(12.0), Value::Empty]);
    assert_eq!(to_csv(&reloaded).unwrap(), input);
}

#[test]
fn integers_beyond_float_precision_survive_csv() {
    let input = "id\n9007199254740993\n1234567890123456789\n";

    let frame = load_frame("ids.csv", input.as_bytes()).unwrap();

    assert_eq!(String::from_utf8(to_csv(&frame).unwrap()).unwrap(), input);
    println!("✓ 19-digit ids written back unchanged");
}

#[test]
fn wide_integers_keep_their_digits_through_excel() {
    let input = b"id\n9007199254740993\n42\n";
    let frame = load_frame("ids.csv", input).unwrap();

    let xlsx = convert(&frame, "ids.csv", ConversionTarget::Excel).unwrap();
    let reloaded = load_frame(&xlsx.file_name, &xlsx.bytes).unwrap();

    assert_eq!(
        reloaded.column("id").unwrap().values,
        vec![Value::text("9007199254740993"), Value::Number(42.0)]
    );
}

#[test]
fn excel_dates_convert_to_iso_text() {
    let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    let frame = Frame::from_rows(
        vec!["when".to_string()],
        vec![
            vec![Value::DateTime(day.and_hms_opt(0, 0, 0).unwrap())],
            vec![Value::DateTime(day.and_hms_opt(10, 30, 0).unwrap())],
        ],
    );

    let xlsx = convert(&frame, "log.csv", ConversionTarget::Excel).unwrap();
    let reloaded = load_frame(&xlsx.file_name, &xlsx.bytes).unwrap();
    let csv = convert(&reloaded, &xlsx.file_name, ConversionTarget::Csv).unwrap();

    assert_eq!(reloaded, frame);
    assert_eq!(csv.bytes, b"when\n2024-03-15\n2024-03-15 10:30:00\n");
}

