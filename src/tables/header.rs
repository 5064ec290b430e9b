use crate::spreadsheet::sheet::Sheet;
use crate::tables::classifier::Classifier;
use crate::tables::segmenter::TableRegion;
use std::collections::BTreeSet;

/// Rows and columns of a region that contain at least one header cell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderInfo {
    /// Sheet rows (1-based) holding a header cell
    pub rows: BTreeSet<usize>,
    /// Sheet columns (1-based) holding a header cell
    pub cols: BTreeSet<usize>,
}

impl HeaderInfo {
    /// Number of column-header levels: `max - min + 1` over header rows.
    pub fn row_depth(&self) -> usize {
        match (self.rows.first(), self.rows.last()) {
            (Some(min), Some(max)) => max - min + 1,
            _ => 0,
        }
    }

    /// Number of row-index levels: `max - min` over header columns.
    ///
    /// Unlike [`row_depth`](Self::row_depth) this does not add one, so a single header
    /// column yields no row index.
    pub fn col_depth(&self) -> usize {
        match (self.cols.first(), self.cols.last()) {
            (Some(min), Some(max)) => max - min,
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Collects header rows and columns over every cell of the region, across all sheet columns.
pub fn infer(sheet: &Sheet, region: &TableRegion, classifier: &Classifier) -> HeaderInfo {
    let mut info = HeaderInfo::default();
    for row in region.rows() {
        for cell in sheet.row(row) {
            if classifier.is_header(&cell) {
                info.rows.insert(cell.row);
                info.cols.insert(cell.col);
            }
        }
    }
    info
}
