//! Writes the data blocks of reconstructed tables into one output sheet.
//!
//! Tables are stacked top to bottom. Each one starts at column 1 and `rows + 2 + spacing`
//! rows below the start of the previous one. Row and column labels are not written.
use crate::error::RustyTablesError;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::reference::MAX_COLS;
use crate::spreadsheet::reference::MAX_ROWS;
use crate::tables::reconstruct::ReconstructedTable;
use rust_xlsxwriter::Format;
use rust_xlsxwriter::Workbook;
use rust_xlsxwriter::Worksheet;
use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use tracing::info;

/// Rows kept free below every table in addition to the configured spacing
pub const RESERVED_ROWS: usize = 2;

const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const TIME_FORMAT: &str = "hh:mm:ss";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Cell at row {row}, column {col} is outside the worksheet")]
    OutOfBounds { row: usize, col: usize },
}

/// Destination of exported values, addressed 1-based.
pub trait SheetWriter {
    type Output;

    fn write(&mut self, row: usize, col: usize, value: &CellValue) -> Result<(), RustyTablesError>;

    /// Completes the sheet, e.g. saves the file.
    fn finish(self) -> Result<Self::Output, RustyTablesError>;
}

fn check_bounds(row: usize, col: usize) -> Result<(), ExportError> {
    if (1..=MAX_ROWS).contains(&row) && (1..=MAX_COLS).contains(&col) {
        Ok(())
    } else {
        Err(ExportError::OutOfBounds { row, col })
    }
}

/// Writes one worksheet of a new xlsx workbook.
pub struct XlsxSheetWriter {
    path: PathBuf,
    workbook: Workbook,
    datetime_format: Format,
    time_format: Format,
}

impl XlsxSheetWriter {
    pub fn new<P: AsRef<Path>>(path: P, sheet_name: &str) -> Result<Self, RustyTablesError> {
        let mut workbook = Workbook::new();
        let mut worksheet = Worksheet::new();
        worksheet.set_name(sheet_name)?;
        workbook.push_worksheet(worksheet);
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            workbook,
            datetime_format: Format::new().set_num_format(DATETIME_FORMAT),
            time_format: Format::new().set_num_format(TIME_FORMAT),
        })
    }
}

impl SheetWriter for XlsxSheetWriter {
    type Output = PathBuf;

    fn write(&mut self, row: usize, col: usize, value: &CellValue) -> Result<(), RustyTablesError> {
        check_bounds(row, col)?;
        let worksheet = self.workbook.worksheet_from_index(0)?;
        let (row, col) = ((row - 1) as u32, (col - 1) as u16);
        match value {
            CellValue::Empty => return Ok(()),
            CellValue::Text(text) | CellValue::Error(text) => worksheet.write_string(row, col, text)?,
            CellValue::Number(number) => worksheet.write_number(row, col, *number)?,
            CellValue::Boolean(boolean) => worksheet.write_boolean(row, col, *boolean)?,
            CellValue::DateTime(datetime) => worksheet.write_datetime_with_format(row, col, datetime, &self.datetime_format)?,
            CellValue::Time(time) => worksheet.write_datetime_with_format(row, col, time, &self.time_format)?,
            CellValue::Formula(formula) => worksheet.write_formula(row, col, formula.as_str())?,
        };
        Ok(())
    }

    fn finish(mut self) -> Result<PathBuf, RustyTablesError> {
        self.workbook.save(&self.path)?;
        debug!(path = %self.path.display(), "workbook saved");
        Ok(self.path)
    }
}

/// Collects written values in memory.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    cells: BTreeMap<(usize, usize), CellValue>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SheetWriter for MemoryWriter {
    type Output = BTreeMap<(usize, usize), CellValue>;

    fn write(&mut self, row: usize, col: usize, value: &CellValue) -> Result<(), RustyTablesError> {
        check_bounds(row, col)?;
        self.cells.insert((row, col), value.clone());
        Ok(())
    }

    fn finish(self) -> Result<Self::Output, RustyTablesError> {
        Ok(self.cells)
    }
}

/// First output row of each table, given their data heights.
pub fn layout<I: IntoIterator<Item = usize>>(heights: I, spacing: usize) -> Vec<usize> {
    let (starts, _) = heights
        .into_iter()
        .fold((Vec::new(), 1usize), |(mut starts, cursor), height| {
            starts.push(cursor);
            (starts, cursor + height + RESERVED_ROWS + spacing)
        });
    starts
}

/// What an export put on the sheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub tables: usize,
    pub rows: usize,
    pub cells: usize,
}

/// Writes every table's data block in order; empty values are skipped.
pub fn export<W: SheetWriter>(tables: &[ReconstructedTable], spacing: usize, writer: &mut W) -> Result<ExportSummary, RustyTablesError> {
    let starts = layout(tables.iter().map(ReconstructedTable::height), spacing);
    let mut summary = ExportSummary::default();
    for (table, start) in tables.iter().zip(starts) {
        debug!(region = %table.region, start, height = table.height(), "exporting table");
        for (offset, row) in table.data.iter().enumerate() {
            for (index, value) in row.iter().enumerate() {
                if is_material(value) {
                    writer.write(start + offset, index + 1, value)?;
                    summary.cells += 1;
                }
            }
        }
        summary.tables += 1;
        summary.rows += table.height();
    }
    info!(tables = summary.tables, rows = summary.rows, cells = summary.cells, "tables exported");
    Ok(summary)
}

fn is_material(value: &CellValue) -> bool {
    match value {
        CellValue::Empty => false,
        CellValue::Text(text) => !text.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::header::HeaderInfo;
    use crate::tables::reconstruct::split;
    use crate::tables::segmenter::TableRegion;
    use pretty_assertions::assert_eq;

    fn table(rows: &[&[&str]]) -> ReconstructedTable {
        let grid: Vec<Vec<CellValue>> = rows
            .iter()
            .map(|row| row.iter().map(|value| CellValue::Text(value.to_string())).collect())
            .collect();
        let cols = grid.first().map(Vec::len).unwrap_or(0);
        split(grid, cols, &TableRegion { start: 1, end: rows.len().max(1) }, HeaderInfo::default())
    }

    #[test]
    fn spacing_law() {
        assert_eq!(layout([2, 1, 4], 3), vec![1, 8, 14]);
        assert_eq!(layout([0, 0], 3), vec![1, 6]);
        assert_eq!(layout([5], 0), vec![1]);
        assert_eq!(layout(Vec::new(), 3), Vec::<usize>::new());
        let heights = [3, 7, 2, 9];
        for spacing in 0..4 {
            let starts = layout(heights, spacing);
            for i in 0..heights.len() - 1 {
                let expected = 1 + heights[..=i].iter().map(|height| height + 2 + spacing).sum::<usize>();
                assert_eq!(starts[i + 1], expected);
            }
        }
    }

    #[test]
    fn data_blocks_only() {
        let tables = vec![table(&[&["1", "Alice"], &["2", "Bob"]]), table(&[&["", "9"]])];
        let mut writer = MemoryWriter::new();
        let summary = export(&tables, 3, &mut writer).unwrap();
        assert_eq!(summary, ExportSummary { tables: 2, rows: 3, cells: 5 });

        let cells = writer.finish().unwrap();
        let text = |value: &str| CellValue::Text(value.to_owned());
        let expected = BTreeMap::from([
            ((1, 1), text("1")),
            ((1, 2), text("Alice")),
            ((2, 1), text("2")),
            ((2, 2), text("Bob")),
            ((8, 2), text("9")),
        ]);
        assert_eq!(cells, expected);
    }

    #[test]
    fn empty_tables_still_advance() {
        let tables = vec![table(&[]), table(&[&["x"]])];
        let mut writer = MemoryWriter::new();
        export(&tables, 3, &mut writer).unwrap();
        assert_eq!(writer.finish().unwrap().keys().copied().collect::<Vec<_>>(), vec![(6, 1)]);
    }

    #[test]
    fn bounds() {
        let mut writer = MemoryWriter::new();
        assert!(writer.write(MAX_ROWS, MAX_COLS, &CellValue::Number(1.0)).is_ok());
        for (row, col) in [(0, 1), (1, 0), (MAX_ROWS + 1, 1), (1, MAX_COLS + 1)] {
            assert!(matches!(
                writer.write(row, col, &CellValue::Number(1.0)),
                Err(RustyTablesError::ExportError(ExportError::OutOfBounds { .. }))
            ));
        }
    }

    #[test]
    fn xlsx_output() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("out.xlsx");
        let mut writer = XlsxSheetWriter::new(&path, "ParsedTables").unwrap();
        writer.write(1, 1, &CellValue::Text("a".to_owned())).unwrap();
        writer.write(1, 2, &CellValue::Number(2.5)).unwrap();
        writer.write(2, 1, &CellValue::Boolean(true)).unwrap();
        writer.write(2, 2, &CellValue::Formula("=B1*2".to_owned())).unwrap();
        assert_eq!(writer.finish().unwrap(), path);
        assert!(path.exists());
    }

    #[test]
    fn invalid_sheet_name() {
        assert!(XlsxSheetWriter::new("out.xlsx", "bad/name").is_err());
    }
}
