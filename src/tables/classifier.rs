//! Cell classification by fill colour.
//!
//! A cell is a header, an entry, a formula or plain. Each predicate looks only at its own
//! colours; [`Classifier::classify`] applies them in that order and the first match wins. Separator detection is a separate predicate because separator and entry
//! cells share a colour by default.
use crate::config::FormulaOptions;
use crate::config::Palette;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::style::Argb;
use crate::tables::TableError;
use tracing::warn;

/// What a cell's fill colour means under the palette.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FillRole {
    Header,
    Entry,
    Calculation,
    LinkedEntry,
    /// Filled with a colour the palette does not name
    Unrecognized,
    /// No fill, or a theme/indexed colour
    Unfilled,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellClass {
    Header,
    Entry,
    Formula,
    Plain,
}

pub struct Classifier<'a> {
    palette: &'a Palette,
    formula: &'a FormulaOptions,
}

impl<'a> Classifier<'a> {
    pub fn new(palette: &'a Palette, formula: &'a FormulaOptions) -> Self {
        Self { palette, formula }
    }

    /// Resolves a fill colour to its role; header wins over entry, entry over calculation.
    pub fn role(&self, fill: Option<Argb>) -> FillRole {
        match fill {
            None => FillRole::Unfilled,
            Some(color) if color == self.palette.header => FillRole::Header,
            Some(color) if color == self.palette.entry() => FillRole::Entry,
            Some(color) if color == self.palette.calculation => FillRole::Calculation,
            Some(color) if color == self.palette.linked_entry => FillRole::LinkedEntry,
            Some(_) => FillRole::Unrecognized,
        }
    }

    /// A blank cell with the separator fill and no border on any side.
    pub fn is_separator(&self, cell: &Cell) -> bool {
        cell.value.is_blank() && cell.fill() == Some(self.palette.separator) && cell.border().is_unstyled()
    }

    pub fn is_header(&self, cell: &Cell) -> bool {
        cell.fill() == Some(self.palette.header)
    }

    pub fn is_entry(&self, cell: &Cell) -> bool {
        cell.fill() == Some(self.palette.entry())
    }

    /// Filled with the calculation or the linked-entry colour, whatever else the colour means.
    pub fn is_formula(&self, cell: &Cell) -> bool {
        cell.fill().is_some_and(|color| color == self.palette.calculation || color == self.palette.linked_entry)
    }

    pub fn classify(&self, cell: &Cell) -> CellClass {
        match self.role(cell.fill()) {
            FillRole::Header => CellClass::Header,
            FillRole::Entry => CellClass::Entry,
            FillRole::Calculation | FillRole::LinkedEntry => CellClass::Formula,
            FillRole::Unrecognized | FillRole::Unfilled => CellClass::Plain,
        }
    }

    /// The value a cell contributes to a reconstructed table.
    ///
    /// Header and entry cells keep their value, formula cells keep their text without the
    /// formula marker, and plain cells become empty text.
    pub fn extract(&self, cell: &Cell) -> Result<CellValue, TableError> {
        match self.classify(cell) {
            CellClass::Header | CellClass::Entry => Ok(cell.value.clone()),
            CellClass::Formula => self.strip_marker(cell).map(CellValue::Text),
            CellClass::Plain => Ok(CellValue::Text(String::new())),
        }
    }

    fn strip_marker(&self, cell: &Cell) -> Result<String, TableError> {
        let text = cell.value.to_string();
        if let Some(stripped) = text.strip_prefix(self.formula.marker.0) {
            return Ok(stripped.to_owned());
        }
        if text.is_empty() {
            return Ok(text);
        }
        if self.formula.strict {
            return Err(TableError::MissingFormulaMarker {
                reference: cell.reference(),
                text,
                marker: self.formula.marker.0,
            });
        }
        warn!(cell = %cell.reference(), %text, marker = %self.formula.marker, "formula cell without marker, kept unchanged");
        Ok(text)
    }
}
