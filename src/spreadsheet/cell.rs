use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::style::Argb;
use crate::spreadsheet::style::Border;
use crate::spreadsheet::style::CellStyle;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use std::fmt::Display;

/// How a numeric cell value should be interpreted, derived from its number format.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum CellType {
    /// Plain numeric values
    #[default]
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
}

impl CellType {
    /// Parses built-in Excel number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Parses custom number format strings to determine cell type.
    /// Literal text, escapes and bracketed sections (colours, locales) are ignored.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_bracket = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }

    fn is_1904(&self) -> bool {
        matches!(self, Self::NumberDateTime1904 | Self::NumberDate1904 | Self::NumberTime1904)
    }

    fn is_time(&self) -> bool {
        matches!(self, Self::NumberTime1900 | Self::NumberTime1904)
    }
}

/// Value held by a cell, read with formulas kept as their literal text.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    /// No value at all
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    /// Formula text including its leading `=`
    Formula(String),
    /// Error code such as `#DIV/0!`
    Error(String),
}

impl CellValue {
    /// Interprets a numeric value according to its number format.
    pub(crate) fn from_number(value: f64, kind: CellType) -> CellValue {
        if kind == CellType::Number {
            return CellValue::Number(value);
        }
        if kind.is_time() && (0.0..1.0).contains(&value) {
            return match serial_to_time(value) {
                Some(time) => CellValue::Time(time),
                None => CellValue::Number(value),
            };
        }
        match serial_to_datetime(value, kind.is_1904()) {
            Some(datetime) => CellValue::DateTime(datetime),
            None => CellValue::Number(value),
        }
    }

    /// True for an absent value or text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(text) | CellValue::Formula(text) | CellValue::Error(text) => write!(f, "{text}"),
            CellValue::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => write!(f, "{}", *value as i64),
            CellValue::Number(value) => write!(f, "{value}"),
            CellValue::Boolean(value) => write!(f, "{}", if *value { "TRUE" } else { "FALSE" }),
            CellValue::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Time(value) => write!(f, "{}", value.format("%H:%M:%S")),
        }
    }
}

/// Converts a spreadsheet serial number to a date and time.
/// Serial 1 is 1900-01-01 (1904-01-02 in the 1904 system); the Lotus 1-2-3 leap year bug is honoured.
pub(crate) fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.trunc() as i64;
    let offset = if is_1904 {
        1_462
    } else if days < 60 {
        1
    } else {
        0
    };
    let milliseconds = (serial.fract() * 86_400_000f64).round() as i64;
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    epoch
        .checked_add_signed(Duration::days(days + offset))?
        .checked_add_signed(Duration::milliseconds(milliseconds))
}

/// Converts the fractional part of a serial number to a time of day.
pub(crate) fn serial_to_time(serial: f64) -> Option<NaiveTime> {
    let milliseconds = (serial.fract() * 86_400_000f64).round() as i64;
    let seconds = u32::try_from(milliseconds / 1_000).ok()?;
    let nanoseconds = u32::try_from((milliseconds % 1_000) * 1_000_000).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds % 86_400, nanoseconds)
}

/// A cell snapshot: position, value and the style attributes the table detection relies on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    /// Row number (1-based)
    pub row: usize,
    /// Column number (1-based)
    pub col: usize,
    pub value: CellValue,
    pub style: CellStyle,
}

impl Cell {
    /// A cell with no value and no style at the given position.
    pub fn blank(row: usize, col: usize) -> Cell {
        Cell {
            row,
            col,
            ..Cell::default()
        }
    }

    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    pub fn fill(&self) -> Option<Argb> {
        self.style.fill
    }

    pub fn border(&self) -> &Border {
        &self.style.border
    }
}
