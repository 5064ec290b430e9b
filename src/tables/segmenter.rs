use crate::spreadsheet::sheet::Sheet;
use crate::tables::classifier::Classifier;
use std::fmt::Display;
use std::ops::RangeInclusive;

/// A contiguous, inclusive range of sheet rows holding one table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TableRegion {
    /// First row (1-based)
    pub start: usize,
    /// Last row (1-based, inclusive)
    pub end: usize,
}

impl TableRegion {
    pub fn rows(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    /// Number of rows in the region.
    pub fn row_count(&self) -> usize {
        self.end + 1 - self.start
    }
}

impl Display for TableRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// A row is a separator when every cell of it, up to the last sheet column, is a separator cell.
pub fn is_separator_row(sheet: &Sheet, row: usize, classifier: &Classifier) -> bool {
    sheet.row(row).all(|cell| classifier.is_separator(&cell))
}

/// Splits the sheet into table regions at separator rows, top to bottom.
pub fn segment(sheet: &Sheet, classifier: &Classifier) -> Vec<TableRegion> {
    let mut regions = Vec::new();
    let mut start: Option<usize> = None;
    for row in 1..=sheet.rows() {
        match (is_separator_row(sheet, row, classifier), start) {
            (true, Some(first)) => {
                regions.push(TableRegion { start: first, end: row - 1 });
                start = None;
            }
            (false, None) => start = Some(row),
            _ => (),
        }
    }
    if let Some(first) = start {
        regions.push(TableRegion { start: first, end: sheet.rows() });
    }
    regions
}
