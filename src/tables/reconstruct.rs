//! Rebuilds one table region as a data block with optional multi-level labels.
//!
//! The region is first turned into a raw grid of classified values, `region rows x sheet
//! columns`, then cut into four blocks by the header depths:
//!
//! ```text
//!             col_depth
//!            |<------->|
//!            +---------+------------------+
//! row_depth  | corner  |  column header   |
//!            +---------+------------------+
//!            |  row    |                  |
//!            |  index  |      data        |
//!            +---------+------------------+
//! ```
//!
//! The corner is dropped. Depths larger than the grid clamp to it. A label block with no
//! entries, or with nothing but blank values, leaves positional labels in place.
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::sheet::Sheet;
use crate::tables::classifier::Classifier;
use crate::tables::header::HeaderInfo;
use crate::tables::segmenter::TableRegion;
use crate::tables::TableError;
use std::fmt::Display;

/// Row or column labels of a reconstructed table.
#[derive(Clone, Debug, PartialEq)]
pub enum Labels {
    /// Default labels `0..n`
    Positional(usize),
    /// One level per header row (column labels) or header column (row labels);
    /// each level has one entry per data column or data row.
    Levels(Vec<Vec<CellValue>>),
}

impl Labels {
    pub fn depth(&self) -> usize {
        match self {
            Labels::Positional(_) => 0,
            Labels::Levels(levels) => levels.len(),
        }
    }

    /// Label of entry `index` as one string per level, or its position.
    fn label(&self, index: usize) -> String {
        match self {
            Labels::Positional(_) => index.to_string(),
            Labels::Levels(levels) => levels
                .iter()
                .map(|level| level.get(index).map(|value| value.to_string()).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(" / "),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReconstructedTable {
    pub region: TableRegion,
    pub header_info: HeaderInfo,
    /// Data block, row-major
    pub data: Vec<Vec<CellValue>>,
    pub row_labels: Labels,
    pub column_labels: Labels,
    width: usize,
}

impl ReconstructedTable {
    /// Number of data rows.
    pub fn height(&self) -> usize {
        self.data.len()
    }

    /// Number of data columns.
    pub fn width(&self) -> usize {
        self.width
    }
}

impl Display for ReconstructedTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let columns = (0..self.width).map(|col| self.column_labels.label(col)).collect::<Vec<_>>();
        writeln!(f, "\t{}", columns.join("\t"))?;
        for (index, row) in self.data.iter().enumerate() {
            let values = row.iter().map(|value| value.to_string()).collect::<Vec<_>>();
            writeln!(f, "{}\t{}", self.row_labels.label(index), values.join("\t"))?;
        }
        Ok(())
    }
}

/// Classifies every cell of the region into a `region rows x sheet columns` grid.
pub fn raw_grid(sheet: &Sheet, region: &TableRegion, classifier: &Classifier) -> Result<Vec<Vec<CellValue>>, TableError> {
    region
        .rows()
        .map(|row| sheet.row(row).map(|cell| classifier.extract(&cell)).collect())
        .collect()
}

pub fn reconstruct(
    sheet: &Sheet,
    region: &TableRegion,
    header_info: HeaderInfo,
    classifier: &Classifier,
) -> Result<ReconstructedTable, TableError> {
    let grid = raw_grid(sheet, region, classifier)?;
    Ok(split(grid, sheet.cols(), region, header_info))
}

/// Cuts a raw grid of `cols` columns into data and label blocks by the header depths.
pub(crate) fn split(mut grid: Vec<Vec<CellValue>>, cols: usize, region: &TableRegion, header_info: HeaderInfo) -> ReconstructedTable {
    let row_split = header_info.row_depth().min(grid.len());
    let col_split = header_info.col_depth().min(cols);
    let width = cols - col_split;

    let mut data = grid.split_off(row_split);
    let header_rows = grid;

    let index_rows = data
        .iter_mut()
        .map(|row| {
            let values = row.split_off(col_split.min(row.len()));
            std::mem::replace(row, values)
        })
        .collect::<Vec<_>>();
    let height = data.len();

    let column_levels: Vec<Vec<CellValue>> = header_rows
        .into_iter()
        .map(|row| row.into_iter().skip(col_split).collect())
        .collect();
    let column_labels = labels(column_levels, width);

    let row_levels: Vec<Vec<CellValue>> = (0..col_split)
        .map(|level| index_rows.iter().map(|row| row.get(level).cloned().unwrap_or_default()).collect())
        .collect();
    let row_labels = labels(row_levels, height);

    ReconstructedTable {
        region: *region,
        header_info,
        data,
        row_labels,
        column_labels,
        width,
    }
}

/// Installs label levels only when the block has at least one entry and one non-blank value.
fn labels(levels: Vec<Vec<CellValue>>, count: usize) -> Labels {
    let has_values = levels.iter().flatten().any(|value| !value.is_blank());
    if count > 0 && has_values {
        Labels::Levels(levels)
    } else {
        Labels::Positional(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::spreadsheet::cell::Cell;
    use crate::spreadsheet::style::Argb;
    use crate::tables::header::infer;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    const HEADER: Argb = Argb(0xFF003366);
    const ENTRY: Argb = Argb(0xFFF2F2F2);
    const CALCULATION: Argb = Argb(0xFFFFFF99);

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_owned())
    }

    fn styled(row: usize, col: usize, value: CellValue, fill: Argb) -> Cell {
        let mut cell = Cell::blank(row, col);
        cell.value = value;
        cell.style.fill = Some(fill);
        cell
    }

    fn grid(rows: &[&[&str]]) -> Vec<Vec<CellValue>> {
        rows.iter().map(|row| row.iter().map(|value| text(value)).collect()).collect()
    }

    fn headers(rows: &[usize], cols: &[usize]) -> HeaderInfo {
        HeaderInfo {
            rows: rows.iter().copied().collect::<BTreeSet<_>>(),
            cols: cols.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    const REGION: TableRegion = TableRegion { start: 1, end: 4 };

    #[test]
    fn column_header_only() {
        let table = split(grid(&[&["ID", "Name"], &["1", "Alice"], &["2", "Bob"]]), 2, &REGION, headers(&[1], &[1]));
        assert_eq!(table.data, grid(&[&["1", "Alice"], &["2", "Bob"]]));
        assert_eq!(table.column_labels, Labels::Levels(grid(&[&["ID", "Name"]])));
        assert_eq!(table.row_labels, Labels::Positional(2));
        assert_eq!((table.height(), table.width()), (2, 2));
    }

    #[test]
    fn multi_level_labels() {
        let raw = grid(&[
            &["", "", "2024", "2024"],
            &["", "", "Q1", "Q2"],
            &["North", "A", "1", "2"],
            &["South", "B", "3", "4"],
        ]);
        // header columns 1..=3 give two row-index levels
        let table = split(raw, 4, &REGION, headers(&[1, 2], &[1, 3]));
        assert_eq!(table.data, grid(&[&["1", "2"], &["3", "4"]]));
        assert_eq!(table.column_labels, Labels::Levels(grid(&[&["2024", "2024"], &["Q1", "Q2"]])));
        assert_eq!(table.row_labels, Labels::Levels(grid(&[&["North", "South"], &["A", "B"]])));
        assert_eq!(table.column_labels.depth(), 2);
        assert_eq!(table.row_labels.depth(), 2);
    }

    #[test]
    fn corner_values_are_dropped() {
        let table = split(grid(&[&["corner", "H"], &["r", "v"]]), 2, &REGION, headers(&[1], &[1, 2]));
        assert_eq!(table.column_labels, Labels::Levels(grid(&[&["H"]])));
        assert_eq!(table.row_labels, Labels::Levels(grid(&[&["r"]])));
        assert_eq!(table.data, grid(&[&["v"]]));
    }

    #[test]
    fn degenerate_table_keeps_the_grid() {
        let raw = grid(&[&["a", "b", "c"], &["d", "", "f"]]);
        let table = split(raw.clone(), 3, &REGION, HeaderInfo::default());
        assert_eq!(table.data, raw);
        assert_eq!(table.row_labels, Labels::Positional(2));
        assert_eq!(table.column_labels, Labels::Positional(3));
    }

    #[test]
    fn blank_label_blocks_stay_positional() {
        // Headers in columns B and C give a row index of column A, which holds nothing
        let raw = grid(&[&["", "ID", "Name"], &["", "1", "Alice"], &["", "2", "Bob"]]);
        let table = split(raw, 3, &REGION, headers(&[1], &[2, 3]));
        assert_eq!(table.data, grid(&[&["1", "Alice"], &["2", "Bob"]]));
        assert_eq!(table.row_labels, Labels::Positional(2));
        assert_eq!(table.column_labels, Labels::Levels(grid(&[&["ID", "Name"]])));

        let table = split(grid(&[&["", ""], &["a", "b"]]), 2, &REGION, headers(&[1], &[1]));
        assert_eq!(table.column_labels, Labels::Positional(2));
    }

    #[test]
    fn depths_clamp_to_the_grid() {
        let table = split(grid(&[&["H", "H"]]), 2, &REGION, headers(&[1, 2, 3], &[1, 5]));
        assert!(table.data.is_empty());
        assert_eq!((table.height(), table.width()), (0, 0));
        assert_eq!(table.row_labels, Labels::Positional(0));
        assert_eq!(table.column_labels, Labels::Positional(0));
    }

    #[test]
    fn header_only_table() {
        let table = split(grid(&[&["X", "Y"]]), 2, &REGION, headers(&[1], &[1, 2]));
        assert_eq!(table.height(), 0);
        assert_eq!(table.width(), 1);
        assert_eq!(table.column_labels, Labels::Levels(grid(&[&["Y"]])));
        assert_eq!(table.row_labels, Labels::Positional(0));
    }

    #[test]
    fn reconstruct_from_sheet() {
        let mut sheet = Sheet::from_cells(
            "test",
            vec![
                styled(6, 1, text("X"), HEADER),
                styled(7, 1, CellValue::Number(9.0), ENTRY),
                styled(7, 2, CellValue::Formula("=A7*2".to_owned()), CALCULATION),
                Cell { value: text("hidden"), ..Cell::blank(7, 3) },
            ],
        );
        sheet.extend_to(7, 3);
        let config = Config::default();
        let classifier = Classifier::new(&config.palette, &config.formula);
        let region = TableRegion { start: 6, end: 7 };
        let info = infer(&sheet, &region, &classifier);
        let table = reconstruct(&sheet, &region, info, &classifier).unwrap();
        assert_eq!(table.data, vec![vec![CellValue::Number(9.0), text("A7*2"), text("")]]);
        assert_eq!(table.column_labels, Labels::Levels(vec![vec![text("X"), text(""), text("")]]));
        assert_eq!(table.row_labels, Labels::Positional(1));
    }

    #[test]
    fn preview() {
        let table = split(grid(&[&["ID", "Name"], &["1", "Alice"]]), 2, &REGION, headers(&[1], &[2]));
        assert_eq!(table.to_string(), "\tID\tName\n0\t1\tAlice\n");
    }
}
