use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{ExportFailure, Result, ToolError};
use crate::io::{Delimiter, OutputFormat, csv_write, excel_write, xml_read};
use crate::progress::{ProgressEvent, ProgressObserver};
use crate::table::{Table, TableBuilder};

/// Settings consumed by [`convert_file`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Overrides the inferred record element.
    pub record_tag: Option<String>,
    pub delimiter: Delimiter,
    pub formats: Vec<OutputFormat>,
    /// Defaults to the directory holding the input file.
    pub output_dir: Option<PathBuf>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            record_tag: None,
            delimiter: Delimiter::default(),
            formats: vec![OutputFormat::Csv, OutputFormat::Excel],
            output_dir: None,
        }
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionSummary {
    pub input: PathBuf,
    pub records: usize,
    pub fields: usize,
    pub files: Vec<PathBuf>,
}

/// Parses `input`, flattens its records and writes every requested format.
///
/// Every format is attempted even if an earlier one fails; the failures are
/// then reported together as [`ToolError::Export`].
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub fn convert_file(
    input: &Path,
    options: &ConvertOptions,
    observer: &dyn ProgressObserver,
) -> Result<ConversionSummary> {
    let result = run_conversion(input, options, observer);
    if let Err(error) = &result {
        observer.notify(&ProgressEvent::Failed {
            message: error.to_string(),
        });
    }
    result
}

fn run_conversion(
    input: &Path,
    options: &ConvertOptions,
    observer: &dyn ProgressObserver,
) -> Result<ConversionSummary> {
    if !input.exists() {
        return Err(ToolError::MissingInput(input.to_path_buf()));
    }
    if options.formats.is_empty() {
        return Err(ToolError::NoOutputFormat);
    }

    observer.notify(&ProgressEvent::LoadStarted {
        path: input.to_path_buf(),
    });
    let root = xml_read::read_document(input)?;
    observer.notify(&ProgressEvent::RootIdentified {
        tag: root.tag().to_string(),
    });

    let table = TableBuilder::new(observer).build(&root, options.record_tag.as_deref());
    info!(
        records = table.rows().len(),
        fields = table.columns().len(),
        "flattened XML records"
    );
    table.ensure_not_empty()?;

    let output_dir = resolve_output_dir(input, options.output_dir.as_deref());
    let files = export_all(&table, input, &output_dir, options, observer)?;

    observer.notify(&ProgressEvent::Completed {
        output_dir,
        files: files.len(),
    });

    Ok(ConversionSummary {
        input: input.to_path_buf(),
        records: table.rows().len(),
        fields: table.columns().len(),
        files,
    })
}

fn resolve_output_dir(input: &Path, requested: Option<&Path>) -> PathBuf {
    match requested {
        Some(dir) => dir.to_path_buf(),
        None => input
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

fn export_all(
    table: &Table,
    input: &Path,
    output_dir: &Path,
    options: &ConvertOptions,
    observer: &dyn ProgressObserver,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut failures = Vec::new();

    for &format in &options.formats {
        let path = format.output_path(input, output_dir);
        observer.notify(&ProgressEvent::ExportStarted { format });

        match export(table, format, &path, options.delimiter) {
            Ok(()) => {
                debug!(%format, path = %path.display(), "export written");
                observer.notify(&ProgressEvent::ExportFinished {
                    format,
                    path: path.clone(),
                });
                files.push(path);
            }
            Err(error) => {
                warn!(%format, path = %path.display(), %error, "export failed");
                failures.push(ExportFailure {
                    format,
                    path,
                    message: error.to_string(),
                });
            }
        }
    }

    if failures.is_empty() {
        Ok(files)
    } else {
        Err(ToolError::Export { failures })
    }
}

/// Writes `table` to `path` in the given format.
pub fn export(table: &Table, format: OutputFormat, path: &Path, delimiter: Delimiter) -> Result<()> {
    match format {
        OutputFormat::Csv => csv_write::write_csv(path, table, delimiter),
        OutputFormat::Excel => excel_write::write_workbook(path, table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_dir_defaults_to_input_parent() {
        assert_eq!(
            resolve_output_dir(Path::new("/data/in.xml"), None),
            PathBuf::from("/data")
        );
        assert_eq!(
            resolve_output_dir(Path::new("in.xml"), None),
            PathBuf::from(".")
        );
        assert_eq!(
            resolve_output_dir(Path::new("/data/in.xml"), Some(Path::new("/out"))),
            PathBuf::from("/out")
        );
    }
}
