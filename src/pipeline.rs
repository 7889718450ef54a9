//! Per-file processing: load, clean, project

use log::{info, warn};
use serde::Serialize;

use crate::cleaning::{self, FillReport};
use crate::error::{Result, SweeperError};
use crate::frame::Frame;
use crate::loader;

/// A file handed to the pipeline, either uploaded or read from disk
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Size in kilobytes, as shown next to the file name
    pub fn size_kb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }
}

/// Which optional steps to run for a file
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineOptions {
    pub remove_duplicates: bool,
    pub fill_missing: bool,
    /// Columns to keep; `None` keeps all of them
    pub columns: Option<Vec<String>>,
}

/// What the cleaning steps did; `None` means the step was not requested
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CleaningReport {
    pub duplicates_removed: Option<usize>,
    pub filled: Option<FillReport>,
}

/// A successfully processed file
#[derive(Clone, Debug)]
pub struct Processed {
    pub frame: Frame,
    pub report: CleaningReport,
}

/// Result of one file in a multi-file run
#[derive(Debug)]
pub struct FileOutcome {
    pub file_name: String,
    pub size_kb: f64,
    pub result: Result<Processed>,
}

/// Runs the pipeline for a single file
///
/// Duplicate removal runs before the mean fill, and projection runs last
/// so that cleaning always sees every column.
///
/// # Errors
/// * [`SweeperError::UnsupportedFormat`] / [`SweeperError::Parse`] from ingestion
/// * [`SweeperError::UnknownColumn`] from projection
pub fn process(file: &UploadedFile, options: &PipelineOptions) -> Result<Processed> {
    let mut frame = loader::load_frame(&file.name, &file.bytes)?;
    let mut report = CleaningReport::default();

    if options.remove_duplicates {
        let removed = cleaning::remove_duplicates(&mut frame);
        info!("{}: removed {} duplicate rows", file.name, removed);
        report.duplicates_removed = Some(removed);
    }

    if options.fill_missing {
        let filled = cleaning::fill_missing_with_mean(&mut frame);
        info!("{}: filled {} missing values", file.name, filled.total_filled());
        report.filled = Some(filled);
    }

    if let Some(columns) = &options.columns {
        frame.select_columns(columns)?;
    }

    Ok(Processed { frame, report })
}

/// Runs the pipeline for every file in turn
///
/// A failing file is logged and recorded in its own outcome; it never
/// stops the files after it.
pub fn process_all(files: &[UploadedFile], options: &PipelineOptions) -> Vec<FileOutcome> {
    files
        .iter()
        .map(|file| {
            let result = process(file, options);
            if let Err(e) = &result {
                warn!("skipping {}: {}", file.name, e);
            }
            FileOutcome {
                file_name: file.name.clone(),
                size_kb: file.size_kb(),
                result,
            }
        })
        .collect()
}

/// Counts successes and failures across outcomes
pub fn summarize(outcomes: &[FileOutcome]) -> (usize, usize) {
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    (outcomes.len() - failed, failed)
}

impl FileOutcome {
    pub fn error(&self) -> Option<&SweeperError> {
        self.result.as_ref().err()
    }
}
