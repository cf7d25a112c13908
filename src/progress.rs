//! Progress notifications emitted while a document is converted.
//!
//! Observers are purely informational: the conversion produces the same
//! output whether events are logged, collected, or dropped.

use std::fmt;
use std::path::PathBuf;

use tracing::{error, info};

use crate::io::OutputFormat;

/// Default number of records between two [`ProgressEvent::RecordProcessed`] events.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;

/// Status notifications emitted by the table builder and the converter.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    LoadStarted { path: PathBuf },
    RootIdentified { tag: String },
    RecordsFound { count: usize },
    /// `index` is 1-based.
    RecordProcessed { index: usize, total: usize },
    ProcessingFinished { records: usize, fields: usize },
    ExportStarted { format: OutputFormat },
    ExportFinished { format: OutputFormat, path: PathBuf },
    Completed { output_dir: PathBuf, files: usize },
    Failed { message: String },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadStarted { path } => write!(f, "loading XML file {}", path.display()),
            Self::RootIdentified { tag } => write!(f, "root element found: {tag}"),
            Self::RecordsFound { count } => write!(f, "found {count} records"),
            Self::RecordProcessed { index, total } => {
                write!(f, "processing record {index}/{total}")
            }
            Self::ProcessingFinished { records, fields } => {
                write!(f, "processing finished: {records} records, {fields} fields")
            }
            Self::ExportStarted { format } => write!(f, "generating {format} file"),
            Self::ExportFinished { format, path } => {
                let name = path.file_name().unwrap_or(path.as_os_str());
                write!(f, "{format} file created: {}", name.to_string_lossy())
            }
            Self::Completed { output_dir, files } => write!(
                f,
                "conversion completed: {files} file(s) written to {}",
                output_dir.display()
            ),
            Self::Failed { message } => write!(f, "conversion failed: {message}"),
        }
    }
}

/// Receives [`ProgressEvent`]s during a conversion.
pub trait ProgressObserver {
    fn notify(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent),
{
    fn notify(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Observer that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn notify(&self, _event: &ProgressEvent) {}
}

/// Observer that forwards every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn notify(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Failed { .. } => error!("{event}"),
            _ => info!("{event}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn closures_are_observers() {
        let seen = RefCell::new(Vec::new());
        let observer = |event: &ProgressEvent| seen.borrow_mut().push(event.to_string());

        observer.notify(&ProgressEvent::RecordsFound { count: 3 });
        observer.notify(&ProgressEvent::RecordProcessed { index: 1, total: 3 });

        assert_eq!(
            seen.into_inner(),
            ["found 3 records", "processing record 1/3"]
        );
    }

    #[test]
    fn export_finished_mentions_file_name_only() {
        let event = ProgressEvent::ExportFinished {
            format: OutputFormat::Csv,
            path: PathBuf::from("/tmp/out/data.csv"),
        };
        assert_eq!(event.to_string(), "CSV file created: data.csv");
    }
}
