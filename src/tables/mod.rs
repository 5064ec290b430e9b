//! # Table Detection Module
//!
//! Finds the logical tables drawn on one sheet and rebuilds them:
//!
//! 1. [`segmenter`] splits the sheet into regions at rows made only of separator cells.
//! 2. [`header`] collects the rows and columns of each region that hold header cells.
//! 3. [`reconstruct`] classifies the region's cells and cuts the grid into data and labels.
//! 4. [`export`] writes the data blocks of all tables into one output sheet.
//!
//! Cell meaning comes only from fill colours, see [`classifier`].
pub mod classifier;
pub mod export;
pub mod header;
pub mod reconstruct;
pub mod segmenter;

use crate::config::Config;
use crate::spreadsheet::sheet::Sheet;
use crate::tables::classifier::Classifier;
use crate::tables::reconstruct::ReconstructedTable;
use thiserror::Error;
use tracing::debug;
use tracing::info;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Formula cell {reference} holds '{text}' which does not start with '{marker}'")]
    MissingFormulaMarker { reference: String, text: String, marker: char },
}

/// Detects and rebuilds every table on the sheet, in region order.
pub fn extract_tables(sheet: &Sheet, config: &Config) -> Result<Vec<ReconstructedTable>, TableError> {
    let classifier = Classifier::new(&config.palette, &config.formula);
    let regions = segmenter::segment(sheet, &classifier);
    info!(sheet = %sheet.name, rows = sheet.rows(), cols = sheet.cols(), regions = regions.len(), "sheet segmented");

    regions
        .iter()
        .map(|region| -> Result<ReconstructedTable, TableError> {
            let header_info = header::infer(sheet, region, &classifier);
            info!(
                %region,
                header_rows = ?header_info.rows,
                header_cols = ?header_info.cols,
                row_depth = header_info.row_depth(),
                col_depth = header_info.col_depth(),
                "table region"
            );
            let table = reconstruct::reconstruct(sheet, region, header_info, &classifier)?;
            debug!(%region, height = table.height(), width = table.width(), "reconstructed table\n{table}");
            Ok(table)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::Cell;
    use crate::spreadsheet::cell::CellValue;
    use crate::spreadsheet::style::Argb;
    use crate::tables::reconstruct::Labels;

    fn styled(row: usize, col: usize, value: CellValue, fill: u32) -> Cell {
        let mut cell = Cell::blank(row, col);
        cell.value = value;
        cell.style.fill = Some(Argb(fill));
        cell
    }

    #[test]
    fn tables_in_region_order() {
        let mut cells = Vec::new();
        for col in 1..=2 {
            cells.push(styled(1, col, CellValue::Empty, 0xFFF2F2F2));
            cells.push(styled(3, col, CellValue::Empty, 0xFFF2F2F2));
        }
        cells.push(styled(2, 1, CellValue::Text("a".to_owned()), 0xFFF2F2F2));
        cells.push(styled(4, 2, CellValue::Formula("=A2".to_owned()), 0xFFFFFF99));
        let sheet = Sheet::from_cells("test", cells);

        let tables = extract_tables(&sheet, &Config::default()).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].data, vec![vec![CellValue::Text("a".to_owned()), CellValue::Text(String::new())]]);
        assert_eq!(tables[1].data, vec![vec![CellValue::Text(String::new()), CellValue::Text("A2".to_owned())]]);
        assert_eq!(tables[1].column_labels, Labels::Positional(2));
    }

    #[test]
    fn strict_formulas_abort() {
        let sheet = Sheet::from_cells("test", vec![styled(1, 1, CellValue::Number(3.0), 0xFFFFCC00)]);
        let mut config = Config::default();
        assert!(extract_tables(&sheet, &config).is_ok());
        config.formula.strict = true;
        assert!(matches!(
            extract_tables(&sheet, &config),
            Err(TableError::MissingFormulaMarker { .. })
        ));
    }
}
