use chrono::NaiveTime;
use log::info;
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, SweeperError};
use crate::frame::{Frame, Value};

/// MIME type for the spreadsheet target
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// MIME type for the CSV target
pub const CSV_MIME: &str = "text/csv";

/// Largest integer magnitude a spreadsheet number cell holds exactly (2^53)
const MAX_EXACT_INT: u64 = 1 << 53;

/// Output formats a frame can be converted to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConversionTarget {
    #[default]
    Csv,
    #[value(alias = "xlsx")]
    Excel,
}

impl ConversionTarget {
    pub fn extension(self) -> &'static str {
        match self {
            ConversionTarget::Csv => "csv",
            ConversionTarget::Excel => "xlsx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ConversionTarget::Csv => CSV_MIME,
            ConversionTarget::Excel => XLSX_MIME,
        }
    }

    /// Label shown to users
    pub fn label(self) -> &'static str {
        match self {
            ConversionTarget::Csv => "CSV",
            ConversionTarget::Excel => "Excel",
        }
    }
}

impl fmt::Display for ConversionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ConversionTarget {
    type Err = SweeperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ConversionTarget::Csv),
            "excel" | "xlsx" => Ok(ConversionTarget::Excel),
            other => Err(SweeperError::BadRequest(format!(
                "unknown conversion target: {}",
                other
            ))),
        }
    }
}

/// A serialised frame ready to be offered for download
#[derive(Clone, Debug)]
pub struct Converted {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Serialises `frame` to `target` and names the result after `file_name`
///
/// # Examples
/// ```
/// use data_sweeper::downloader::{convert, ConversionTarget};
/// use data_sweeper::loader::load_frame;
///
/// let frame = load_frame("sales.csv", b"region,total\nnorth,10\n").unwrap();
/// let converted = convert(&frame, "sales.csv", ConversionTarget::Excel).unwrap();
/// assert_eq!(converted.file_name, "sales.xlsx");
/// assert!(!converted.bytes.is_empty());
/// ```
pub fn convert(frame: &Frame, file_name: &str, target: ConversionTarget) -> Result<Converted> {
    let bytes = match target {
        ConversionTarget::Csv => to_csv(frame)?,
        ConversionTarget::Excel => to_xlsx(frame)?,
    };
    let output = output_file_name(file_name, target);

    info!("converted {} to {} ({} bytes)", file_name, output, bytes.len());
    Ok(Converted {
        file_name: output,
        mime_type: target.mime_type(),
        bytes,
    })
}

/// Convert a frame to CSV format
///
/// Writes the header row followed by one record per row. There is no
/// index column. Quoting of commas, quotes and newlines is left to the
/// `csv` writer.
pub fn to_csv(frame: &Frame) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(frame.column_names())?;
    for row in frame.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| SweeperError::Export(e.to_string()))
}

/// Convert a frame to XLSX format
///
/// This function exports a frame using the rust_xlsxwriter library into a
/// single worksheet with a bold header row. Values keep their native cell
/// types; missing values are left blank.
pub fn to_xlsx(frame: &Frame) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let date = Format::new().set_num_format("yyyy-mm-dd");
    let datetime = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    let worksheet = workbook.add_worksheet();

    for (c, column) in frame.columns().iter().enumerate() {
        let col = u16::try_from(c)
            .map_err(|_| SweeperError::Export(format!("too many columns: {}", frame.width())))?;
        worksheet.write_string_with_format(0, col, &column.name, &header)?;

        for (r, value) in column.values.iter().enumerate() {
            let row = u32::try_from(r + 1)
                .map_err(|_| SweeperError::Export(format!("too many rows: {}", frame.height())))?;
            match value {
                Value::Int(i) if i.unsigned_abs() <= MAX_EXACT_INT => {
                    worksheet.write_number(row, col, *i as f64)?;
                }
                // Excel stores numbers as doubles; keep wider integers as their digits
                Value::Int(i) => {
                    worksheet.write_string(row, col, i.to_string())?;
                }
                Value::Number(n) => {
                    worksheet.write_number(row, col, *n)?;
                }
                Value::Text(s) => {
                    worksheet.write_string(row, col, s)?;
                }
                Value::Bool(b) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                Value::DateTime(dt) if dt.time() == NaiveTime::MIN => {
                    worksheet.write_datetime_with_format(row, col, dt, &date)?;
                }
                Value::DateTime(dt) => {
                    worksheet.write_datetime_with_format(row, col, dt, &datetime)?;
                }
                Value::Empty => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Swaps the extension of `file_name` for the target's
///
/// A name without an extension gets one appended.
pub fn output_file_name(file_name: &str, target: ConversionTarget) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    format!("{}.{}", stem, target.extension())
}
