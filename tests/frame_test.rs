use data_sweeper::SweeperError;
use data_sweeper::frame::Value;
use data_sweeper::loader::load_frame;
use pretty_assertions::assert_eq;

const PEOPLE: &[u8] = b"id,name,age,city\n1,ann,31,oslo\n2,bob,,rome\n3,cy,45,lima\n";

#[test]
fn selection_keeps_original_column_order() {
    let mut frame = load_frame("people.csv", PEOPLE).unwrap();

    frame.select_columns(&["city", "id"]).unwrap();

    assert_eq!(frame.column_names(), vec!["id", "city"]);
}

#[test]
fn selection_preserves_row_alignment() {
    let mut frame = load_frame("people.csv", PEOPLE).unwrap();

    frame.select_columns(&["name", "age"]).unwrap();

    let rows: Vec<Vec<Value>> = frame
        .rows()
        .map(|r| r.into_iter().cloned().collect())
        .collect();
    assert_eq!(
        rows,
        vec![
            vec![Value::text("ann"), Value::Int(31)],
            vec![Value::text("bob"), Value::Empty],
            vec![Value::text("cy"), Value::Int(45)],
        ]
    );
}

#[test]
fn selecting_all_columns_changes_nothing() {
    let mut frame = load_frame("people.csv", PEOPLE).unwrap();
    let before = frame.clone();
    let all: Vec<String> = before.column_names().iter().map(|s| s.to_string()).collect();

    frame.select_columns(&all).unwrap();

    assert_eq!(frame, before);
}

#[test]
fn unknown_column_is_rejected_without_changes() {
    let mut frame = load_frame("people.csv", PEOPLE).unwrap();
    let before = frame.clone();

    let err = frame.select_columns(&["name", "salary"]).unwrap_err();

    assert!(matches!(err, SweeperError::UnknownColumn(ref c) if c == "salary"));
    assert_eq!(frame, before);
}

#[test]
fn empty_selection_keeps_row_count() {
    let mut frame = load_frame("people.csv", PEOPLE).unwrap();
    let none: [&str; 0] = [];

    frame.select_columns(&none).unwrap();

    assert_eq!(frame.width(), 0);
    assert_eq!(frame.height(), 3);
}

#[test]
fn head_limits_preview_rows() {
    let frame = load_frame("people.csv", PEOPLE).unwrap();
    assert_eq!(frame.head(2).len(), 2);
    assert_eq!(frame.head(10).len(), 3);
}
