//! # Spreadsheet Reading Module
//!
//! Reads one worksheet of an Office Open XML workbook (`.xlsx`, `.xlsm`) into a [`Sheet`]:
//! every recorded cell with its value, fill colour, border and number format. Formula cells
//! are kept as their literal formula text rather than their cached results.
pub mod cell;
pub mod criteria;
pub(crate) mod excel;
pub mod reference;
pub mod sheet;
pub mod style;
pub mod xlsx;

use crate::error::RustyTablesError;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use std::ffi::OsStr;
use std::path::Path;
use thiserror::Error;

/// Errors raised while locating and reading workbook content.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Cannot detect file format for '{0}'")]
    InvalidFileFormat(String),

    #[error("Spreadsheet '{0}' is password protected or not an Office Open XML package")]
    SpreadsheetPasswordProtectedError(String),

    #[error("Spreadsheet '{0}' contains no sheets")]
    SpreadsheetEmptyError(String),

    #[error("Missing part '{0}' in spreadsheet package")]
    FileError(String),

    #[error("No sheet in '{0}' matches the requested name")]
    SheetNotFound(String),

    #[error("Invalid cell value at '{2}' in sheet '{1}' of '{0}': {3}")]
    CellValueError(String, String, String, String),
}

/// A workbook that can hand out one of its sheets.
pub trait Spreadsheet {
    /// Returns the file name of this spreadsheet
    fn name(&self) -> String;

    /// Sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Reads the sheet chosen by `criteria`
    fn read_sheet(&mut self, criteria: &Criteria) -> Result<Sheet, RustyTablesError>;
}

/// Opens a spreadsheet file, choosing the reader from the file extension.
pub fn open<P: AsRef<Path>>(path: P) -> Result<Box<dyn Spreadsheet>, RustyTablesError> {
    let path = path.as_ref();
    let file_name = path.to_string_lossy().to_string();
    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .map(|extension| extension.to_ascii_lowercase());
    match extension.as_deref() {
        Some("xlsx") | Some("xlsm") => Ok(Box::new(XlsxSpreadsheet::open(&file_name)?)),
        _ => Err(SpreadsheetError::InvalidFileFormat(file_name))?,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extensions() {
        for name in ["book.xls", "book.ods", "book.csv", "book"] {
            assert!(matches!(
                open(name),
                Err(RustyTablesError::SpreadsheetError(SpreadsheetError::InvalidFileFormat(_)))
            ));
        }
    }

    #[test]
    fn missing_file() {
        assert!(matches!(open("does/not/exist.xlsx"), Err(RustyTablesError::IoError(_))));
    }
}
