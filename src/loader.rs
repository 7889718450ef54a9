use calamine::{Data, DataType, Reader, Xls, Xlsx};
use chrono::{Duration, NaiveTime};
use log::info;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use crate::error::{Result, SweeperError};
use crate::frame::{Column, Frame, Value};

/// Tokens read as missing values in CSV input
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const TRUE_VALUES: &[&str] = &["True", "TRUE", "true"];
const FALSE_VALUES: &[&str] = &["False", "FALSE", "false"];

/// Input formats recognised by their file extension
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
}

impl FileFormat {
    /// Detects the format from a file name
    ///
    /// # Errors
    /// * [`SweeperError::UnsupportedFormat`] when the extension is missing or
    ///   not one of `csv`, `xlsx`, `xls` (case-insensitive)
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(FileFormat::Csv),
            Some("xlsx") => Ok(FileFormat::Xlsx),
            Some("xls") => Ok(FileFormat::Xls),
            Some(ext) => Err(SweeperError::UnsupportedFormat {
                file: file_name.to_string(),
                extension: format!(".{}", ext),
            }),
            None => Err(SweeperError::UnsupportedFormat {
                file: file_name.to_string(),
                extension: "(none)".to_string(),
            }),
        }
    }
}

/// Detect file type and load appropriate format
///
/// This function examines the file name's extension and parses `bytes`
/// with the matching reader.
///
/// # Arguments
/// * `file_name` - Name of the uploaded file, used for dispatch and errors
/// * `bytes` - Raw file contents
///
/// # Returns
/// * `Result<Frame>` - The loaded frame or an error naming the file
///
/// # Examples
/// ```
/// use data_sweeper::loader::load_frame;
///
/// let frame = load_frame("people.csv", b"name,age\nann,31\n").unwrap();
/// assert_eq!(frame.column_names(), vec!["name", "age"]);
/// ```
pub fn load_frame(file_name: &str, bytes: &[u8]) -> Result<Frame> {
    let frame = match FileFormat::from_file_name(file_name)? {
        FileFormat::Csv => from_csv(file_name, bytes)?,
        FileFormat::Xlsx => from_excel::<Xlsx<_>>(file_name, bytes)?,
        FileFormat::Xls => from_excel::<Xls<_>>(file_name, bytes)?,
    };

    info!(
        "loaded {} ({} rows x {} columns)",
        file_name,
        frame.height(),
        frame.width()
    );
    Ok(frame)
}

/// Load a frame from CSV bytes
///
/// The first record is the header. Column types are inferred per column:
/// numeric when every present field parses as a number, boolean when
/// every present field is a true/false token, text otherwise.
pub fn from_csv(file_name: &str, bytes: &[u8]) -> Result<Frame> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| SweeperError::parse(file_name, e))?
        .clone();
    if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
        return Err(SweeperError::parse(file_name, "No columns to parse from file"));
    }

    let width = headers.len();
    let mut raw: Vec<Vec<String>> = vec![Vec::new(); width];

    for result in reader.records() {
        let record = result.map_err(|e| SweeperError::parse(file_name, e))?;
        if record.len() > width {
            let line = record.position().map_or(0, |p| p.line());
            return Err(SweeperError::parse(
                file_name,
                format!(
                    "Expected {} fields in line {}, saw {}",
                    width,
                    line,
                    record.len()
                ),
            ));
        }
        for (c, column) in raw.iter_mut().enumerate() {
            column.push(record.get(c).unwrap_or("").to_string());
        }
    }

    let names = unique_headers(headers.iter().map(str::to_string).collect());
    let columns = names
        .into_iter()
        .zip(raw)
        .map(|(name, fields)| Column {
            name,
            values: infer_column(fields),
        })
        .collect();

    Ok(Frame::from_columns(columns))
}

/// Load a frame from spreadsheet bytes
///
/// Only the first worksheet is read and its first row becomes the header.
/// An empty worksheet yields an empty frame.
pub fn from_excel<R>(file_name: &str, bytes: &[u8]) -> Result<Frame>
where
    R: Reader<Cursor<Vec<u8>>>,
    R::Error: std::fmt::Display,
{
    let mut workbook = R::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| SweeperError::parse(file_name, e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SweeperError::parse(file_name, "No sheets found in workbook"))?
        .map_err(|e| SweeperError::parse(file_name, e))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Frame::default());
    };

    let headers = unique_headers(header_row.iter().map(header_text).collect());
    let data = rows
        .map(|row| row.iter().map(cell_value).collect())
        .collect();

    Ok(Frame::from_rows(headers, data))
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::Int(*i),
        Data::Float(f) => Value::Number(*f),
        Data::String(s) if s.is_empty() => Value::Empty,
        Data::String(s) => Value::Text(s.clone()),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(d) if d.is_duration() => cell
            .as_duration()
            .map_or_else(|| Value::Text(cell.to_string()), |d| Value::Text(duration_text(d))),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .or_else(|| cell.as_date().map(|d| d.and_time(NaiveTime::MIN)))
            .map_or_else(|| Value::Text(cell.to_string()), Value::DateTime),
        Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Empty | Data::Error(_) => Value::Empty,
    }
}

/// Formats a duration cell as `<days> days HH:MM:SS`
fn duration_text(duration: Duration) -> String {
    let seconds = duration.num_seconds();
    let (days, rest) = (seconds.div_euclid(86_400), seconds.rem_euclid(86_400));
    format!(
        "{} days {:02}:{:02}:{:02}",
        days,
        rest / 3600,
        rest % 3600 / 60,
        rest % 60
    )
}

fn header_text(cell: &Data) -> String {
    match cell_value(cell) {
        Value::Empty => String::new(),
        value => value.to_string(),
    }
}

/// Names empty headers `Unnamed: <index>` and suffixes repeats with `.1`, `.2`, ...
fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(raw.len());

    for (i, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            name
        };

        let mut candidate = base.clone();
        if let Some(&seen) = counts.get(&base) {
            let mut n = seen;
            loop {
                n += 1;
                candidate = format!("{}.{}", base, n);
                if !counts.contains_key(&candidate) {
                    break;
                }
            }
            counts.insert(base, n);
        }
        counts.insert(candidate.clone(), 0);
        names.push(candidate);
    }

    names
}

fn is_missing(field: &str) -> bool {
    NA_VALUES.contains(&field)
}

fn parse_int(field: &str) -> Option<i64> {
    field.trim().parse::<i64>().ok()
}

fn parse_number(field: &str) -> Option<f64> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

fn parse_bool(field: &str) -> Option<bool> {
    if TRUE_VALUES.contains(&field) {
        Some(true)
    } else if FALSE_VALUES.contains(&field) {
        Some(false)
    } else {
        None
    }
}

fn typed<T>(fields: &[String], parse: fn(&str) -> Option<T>, wrap: fn(T) -> Value) -> Vec<Value> {
    fields
        .iter()
        .map(|f| {
            if is_missing(f) {
                Value::Empty
            } else {
                parse(f).map_or(Value::Empty, wrap)
            }
        })
        .collect()
}

/// Types a column of raw CSV fields as a whole
fn infer_column(fields: Vec<String>) -> Vec<Value> {
    let present = || fields.iter().filter(|f| !is_missing(f));

    // Integer columns stay exact; one fractional field makes the whole column float
    if present().all(|f| parse_int(f).is_some()) {
        return typed(&fields, parse_int, Value::Int);
    }

    if present().all(|f| parse_number(f).is_some()) {
        return typed(&fields, parse_number, Value::Number);
    }

    if present().all(|f| parse_bool(f).is_some()) {
        return fields
            .iter()
            .map(|f| parse_bool(f).map_or(Value::Empty, Value::Bool))
            .collect();
    }

    fields
        .into_iter()
        .map(|f| if is_missing(&f) { Value::Empty } else { Value::Text(f) })
        .collect()
}
