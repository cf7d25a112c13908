use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, ToolError};
use crate::table::Table;

/// Field separators accepted for CSV output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
    Tab,
    Pipe,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
            Delimiter::Pipe => b'|',
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Tab => write!(f, "\\t"),
            other => write!(f, "{}", char::from(other.as_byte())),
        }
    }
}

/// Accepts either the literal character or its name.
impl FromStr for Delimiter {
    type Err = ToolError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "," | "comma" => Ok(Delimiter::Comma),
            ";" | "semicolon" => Ok(Delimiter::Semicolon),
            "\t" | "\\t" | "tab" => Ok(Delimiter::Tab),
            "|" | "pipe" => Ok(Delimiter::Pipe),
            other => Err(ToolError::InvalidDelimiter(other.to_string())),
        }
    }
}

/// Writes the table as delimited UTF-8 text: the sorted header row followed by
/// one CRLF-terminated line per record.
pub fn write_csv(path: &Path, table: &Table, delimiter: Delimiter) -> Result<()> {
    table.ensure_not_empty()?;
    let file = File::create(path)?;
    write_delimited(file, table, delimiter)
}

/// Same as [`write_csv`] but targets any writer.
pub fn write_delimited<W: io::Write>(
    output: W,
    table: &Table,
    delimiter: Delimiter,
) -> Result<()> {
    table.ensure_not_empty()?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter.as_byte())
        .terminator(csv::Terminator::CRLF)
        .from_writer(output);

    writer.write_record(table.columns())?;
    for row in table.cells() {
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}
