use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::io::OutputFormat;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool parses, flattens, or exports data.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the input document is not well-formed XML.
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Raised when the input bytes cannot be decoded in their declared encoding.
    #[error("XML parse error: {0}")]
    InvalidEncoding(String),

    /// Raised when no non-empty records were found and an export is requested.
    #[error("no data to export: the document produced no non-empty records")]
    NoData,

    /// Errors bubbled up from the CSV writer.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when a table does not fit the worksheet grid.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised once every requested format was attempted and at least one failed.
    #[error("export failed for {}", ExportFailures(.failures))]
    Export { failures: Vec<ExportFailure> },

    /// Raised when JSON serialization of the conversion summary fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when a delimiter outside the supported set is requested.
    #[error("unsupported CSV delimiter {0:?}; expected one of ',', ';', tab, '|'")]
    InvalidDelimiter(String),

    /// Raised when a conversion is requested without any output format.
    #[error("at least one output format must be requested")]
    NoOutputFormat,

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// A single output format that could not be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFailure {
    pub format: OutputFormat,
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for ExportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.format, self.path.display(), self.message)
    }
}

struct ExportFailures<'a>(&'a [ExportFailure]);

impl fmt::Display for ExportFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, failure) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}
