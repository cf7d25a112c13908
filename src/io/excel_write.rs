use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use crate::error::{Result, ToolError};
use crate::table::Table;

/// Name of the single worksheet written by [`write_workbook`].
pub const SHEET_NAME: &str = "Sheet1";

/// Writes the table to a single-sheet workbook. Every cell is stored as a
/// string so values are never reinterpreted as numbers or dates.
pub fn write_workbook(path: &Path, table: &Table) -> Result<()> {
    table.ensure_not_empty()?;

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new().set_bold();
    for (col_idx, header) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, column_index(col_idx)?, header, &header_format)?;
    }

    for (row_idx, row) in table.cells().enumerate() {
        let sheet_row = row_index(row_idx + 1)?;
        for (col_idx, cell) in row.into_iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            worksheet.write_string(sheet_row, column_index(col_idx)?, cell)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn row_index(index: usize) -> Result<u32> {
    u32::try_from(index)
        .map_err(|_| ToolError::InvalidWorkbook(format!("row {index} exceeds the sheet limit")))
}

fn column_index(index: usize) -> Result<u16> {
    u16::try_from(index).map_err(|_| {
        ToolError::InvalidWorkbook(format!("column {index} exceeds the sheet limit"))
    })
}
