use crate::spreadsheet::cell::Cell;
use std::borrow::Cow;
use std::collections::HashMap;

/// One worksheet held fully in memory.
///
/// Cells are stored sparsely in reading order; the grid they describe always starts at
/// row 1, column 1 and extends to `rows` x `cols`. Positions without a recorded cell
/// read as blank, unstyled cells.
#[derive(Debug, Default)]
pub struct Sheet {
    /// Source file name
    pub file_name: String,
    /// Sheet name
    pub name: String,
    /// Recorded cells
    pub(crate) cells: Vec<Cell>,
    /// Index mapping from (row, col) to position in `cells`
    indexes: HashMap<(usize, usize), usize>,
    /// Last row of the grid (1-based, 0 for an empty sheet)
    rows: usize,
    /// Last column of the grid (1-based, 0 for an empty sheet)
    cols: usize,
}

impl Sheet {
    pub(crate) fn new(file_name: &str, name: &str) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            ..Self::default()
        }
    }

    /// Builds a sheet from cells; mostly useful for tests and embedders.
    pub fn from_cells(name: &str, cells: impl IntoIterator<Item = Cell>) -> Self {
        let mut sheet = Self::new("", name);
        for cell in cells {
            sheet.push(cell);
        }
        sheet
    }

    /// Number of rows in the grid.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns in the grid.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Adds a cell, replacing any earlier cell at the same position.
    pub(crate) fn push(&mut self, cell: Cell) {
        if cell.row == 0 || cell.col == 0 {
            return;
        }
        self.extend_to(cell.row, cell.col);
        let position = (cell.row, cell.col);
        match self.indexes.get(&position) {
            Some(index) => self.cells[*index] = cell,
            None => {
                self.indexes.insert(position, self.cells.len());
                self.cells.push(cell);
            }
        }
    }

    /// Grows the grid so that it covers `(row, col)`, e.g. from a `<dimension>` element.
    pub(crate) fn extend_to(&mut self, row: usize, col: usize) {
        self.rows = self.rows.max(row);
        self.cols = self.cols.max(col);
    }

    /// Gets the recorded cell at a 1-based position.
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.indexes
            .get(&(row, col))
            .and_then(|index| self.cells.get(*index))
    }

    /// Gets the cell at a 1-based position, a blank cell when nothing was recorded there.
    pub fn cell(&self, row: usize, col: usize) -> Cow<'_, Cell> {
        match self.get(row, col) {
            Some(cell) => Cow::Borrowed(cell),
            None => Cow::Owned(Cell::blank(row, col)),
        }
    }

    /// Iterates every column of a row, left to right.
    pub fn row(&self, row: usize) -> impl Iterator<Item = Cow<'_, Cell>> + '_ {
        (1..=self.cols).map(move |col| self.cell(row, col))
    }

    /// Returns true if the sheet has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}
