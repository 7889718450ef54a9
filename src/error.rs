//! Error types shared by every stage of the conversion pipeline

use thiserror::Error;

/// Result type for sweeper operations
pub type Result<T> = std::result::Result<T, SweeperError>;

/// Errors that can occur while ingesting, cleaning or exporting a file
///
/// Ingestion failures (`UnsupportedFormat`, `Parse`) carry the name of the
/// failing file so they can be reported inline next to it while the
/// remaining uploads keep going.
#[derive(Debug, Error)]
pub enum SweeperError {
    /// The file extension is neither CSV nor a spreadsheet
    #[error("Unsupported file type for {file}: {extension}")]
    UnsupportedFormat { file: String, extension: String },

    /// The underlying reader rejected the file contents
    #[error("Error loading {file}: {message}")]
    Parse { file: String, message: String },

    /// A projection named a column the frame does not have
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Serialising to the target format failed
    #[error("Export failed: {0}")]
    Export(String),

    /// The frame has nothing to chart
    #[error("Chart error: {0}")]
    Chart(String),

    /// Drawing or encoding the chart image failed
    #[error("Chart rendering failed: {0}")]
    Render(String),

    /// Malformed request (HTTP surface only)
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl SweeperError {
    pub(crate) fn parse(file: &str, message: impl ToString) -> Self {
        SweeperError::Parse {
            file: file.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<csv::Error> for SweeperError {
    fn from(e: csv::Error) -> Self {
        SweeperError::Export(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for SweeperError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        SweeperError::Export(e.to_string())
    }
}
