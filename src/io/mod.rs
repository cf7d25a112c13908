pub mod csv_write;
pub mod excel_write;
pub mod xml_read;

use std::fmt;
use std::path::{Path, PathBuf};

pub use csv_write::Delimiter;

/// Tabular encodings the converter can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum OutputFormat {
    Csv,
    Excel,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Excel => "xlsx",
        }
    }

    /// Path of the file written for `input` inside `output_dir`, named after
    /// the input's base name.
    pub fn output_path(self, input: &Path, output_dir: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        output_dir.join(format!("{stem}.{}", self.extension()))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "CSV"),
            OutputFormat::Excel => write!(f, "Excel"),
        }
    }
}
