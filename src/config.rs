//! # Configuration
//!
//! The styling convention (which fill colours mean what), the formula-marker policy and the
//! export layout. Every field has a default, so a configuration file only needs the keys it
//! changes:
//!
//! ```toml
//! [palette]
//! header = "FF1F4E79"
//!
//! [formula]
//! strict = true
//!
//! [export]
//! spacing = 1
//! ```
use crate::error::RustyTablesError;
use crate::spreadsheet::style::Argb;
use serde::Deserialize;
use std::fmt::Display;
use std::path::Path;
use thiserror::Error;

/// Longest sheet name Excel accepts
const MAX_SHEET_NAME_LENGTH: usize = 31;

/// Characters Excel forbids in sheet names
const INVALID_SHEET_NAME_CHARACTERS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid colour '{0}', expected RRGGBB or AARRGGBB hex digits")]
    InvalidColor(String),

    #[error("Invalid formula marker '{0}', expected exactly one character")]
    InvalidFormulaMarker(String),

    #[error("Invalid output sheet name '{0}'")]
    InvalidSheetName(String),
}

/// Fill colours of the styling convention.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Palette {
    /// Fill of blank cells in separator rows
    pub separator: Argb,
    /// Fill of header cells
    pub header: Argb,
    /// Fill of plain entry cells; the separator colour when not set
    pub entry: Option<Argb>,
    /// Fill of calculated cells
    pub calculation: Argb,
    /// Fill of cells linked to another entry
    pub linked_entry: Argb,
}

impl Palette {
    pub fn entry(&self) -> Argb {
        self.entry.unwrap_or(self.separator)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            separator: Argb(0xFFF2F2F2),
            header: Argb(0xFF003366),
            entry: None,
            calculation: Argb(0xFFFFFF99),
            linked_entry: Argb(0xFFFFCC00),
        }
    }
}

/// The single character that prefixes formula text, `=` by default.
#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(try_from = "String")]
pub struct FormulaMarker(pub char);

impl Default for FormulaMarker {
    fn default() -> Self {
        FormulaMarker('=')
    }
}

impl TryFrom<String> for FormulaMarker {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let mut characters = value.chars();
        match (characters.next(), characters.next()) {
            (Some(marker), None) => Ok(FormulaMarker(marker)),
            _ => Err(ConfigError::InvalidFormulaMarker(value)),
        }
    }
}

impl Display for FormulaMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FormulaOptions {
    pub marker: FormulaMarker,
    /// Fail on formula-coloured text without the marker instead of passing it through
    pub strict: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ExportOptions {
    /// Blank rows between two exported tables, on top of the two reserved rows
    pub spacing: usize,
    /// Name of the output worksheet
    pub sheet_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            spacing: 3,
            sheet_name: "ParsedTables".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub palette: Palette,
    pub formula: FormulaOptions,
    pub export: ExportOptions,
}

impl Config {
    /// Loads a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, RustyTablesError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&text)
    }

    /// Parses TOML text; missing keys keep their defaults.
    pub fn from_toml(text: &str) -> Result<Config, RustyTablesError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = &self.export.sheet_name;
        if name.trim().is_empty()
            || name.chars().count() > MAX_SHEET_NAME_LENGTH
            || name.contains(&INVALID_SHEET_NAME_CHARACTERS[..])
            || name.starts_with('\'')
            || name.ends_with('\'')
        {
            return Err(ConfigError::InvalidSheetName(name.to_owned()));
        }
        Ok(())
    }
}
