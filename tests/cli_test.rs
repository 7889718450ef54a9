use data_sweeper::frame::Value;
use data_sweeper::loader::load_frame;
use pretty_assertions::assert_eq;
use std::fs;
use std::process::Command;

fn sweep() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sweep"))
}

#[test]
fn converts_csv_to_excel_next_to_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("orders.csv");
    fs::write(&input, "item,qty\npen,2\npen,2\ncup,\n").unwrap();

    let status = sweep()
        .arg(&input)
        .args(["--to", "excel", "--remove-duplicates", "--fill-missing"])
        .status()
        .unwrap();
    assert!(status.success());

    let output = dir.path().join("orders.xlsx");
    let frame = load_frame("orders.xlsx", &fs::read(&output).unwrap()).unwrap();
    assert_eq!(frame.height(), 2);
    assert_eq!(
        frame.column("qty").unwrap().values,
        vec![Value::Number(2.0), Value::Number(2.0)]
    );
}

#[test]
fn failing_file_sets_exit_code_but_others_convert() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.xlsx");
    let bad = dir.path().join("bad.txt");
    let out = dir.path().join("out");

    let frame = load_frame("seed.csv", b"a,b\n1,x\n2,y\n").unwrap();
    fs::write(&good, data_sweeper::downloader::to_xlsx(&frame).unwrap()).unwrap();
    fs::write(&bad, "nope").unwrap();

    let status = sweep()
        .arg(&bad)
        .arg(&good)
        .args(["--columns", "b"])
        .arg("--output-dir")
        .arg(&out)
        .status()
        .unwrap();

    assert!(!status.success());
    let csv = fs::read_to_string(out.join("good.csv")).unwrap();
    assert_eq!(csv, "b\nx\ny\n");
}

#[test]
fn refuses_to_overwrite_its_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("same.csv");
    fs::write(&input, "a\n1\n").unwrap();

    let status = sweep().arg(&input).status().unwrap();

    assert!(!status.success());
    assert_eq!(fs::read_to_string(&input).unwrap(), "a\n1\n");
}

#[test]
fn never_overwrites_another_input() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("a.csv");
    let xlsx = dir.path().join("a.xlsx");
    fs::write(&csv, "orig\n1\n").unwrap();

    let frame = load_frame("seed.csv", b"other\n2\n").unwrap();
    fs::write(&xlsx, data_sweeper::downloader::to_xlsx(&frame).unwrap()).unwrap();

    let status = sweep().arg(&csv).arg(&xlsx).status().unwrap();

    assert!(!status.success());
    assert_eq!(fs::read_to_string(&csv).unwrap(), "orig\n1\n");
    println!("✓ a.xlsx -> a.csv refused while a.csv is an input");
}

#[test]
fn same_stem_inputs_do_not_clobber_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("one").join("report.csv");
    let second = dir.path().join("two").join("report.csv");
    let out = dir.path().join("out");
    for (path, body) in [(&first, "v\n1\n"), (&second, "v\n2\n")] {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    let status = sweep()
        .arg(&first)
        .arg(&second)
        .args(["--to", "excel"])
        .arg("--output-dir")
        .arg(&out)
        .status()
        .unwrap();

    assert!(!status.success());
    let frame = load_frame("report.xlsx", &fs::read(out.join("report.xlsx")).unwrap()).unwrap();
    assert_eq!(frame.column("v").unwrap().values, vec![Value::Number(1.0)]);
}
