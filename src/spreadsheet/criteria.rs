use crate::error::RustyTablesError;
use glob::Pattern;

/// Selects the single sheet a run works on.
#[derive(Clone, Debug, Default)]
pub struct Criteria {
    /// Sheet name patterns; when absent the workbook's active sheet is used.
    pub sheet_name_patterns: Option<Vec<Pattern>>,
}

impl Criteria {
    /// Builds criteria from glob patterns such as `Budget*`; an empty list means "active sheet".
    pub fn with_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self, RustyTablesError> {
        if patterns.is_empty() {
            return Ok(Self::default());
        }
        let patterns = patterns
            .iter()
            .map(|pattern| Pattern::new(pattern.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            sheet_name_patterns: Some(patterns),
        })
    }

    /// Checks if a sheet name matches the criteria patterns.
    /// Returns true if no patterns are specified or if name matches any pattern.
    pub(crate) fn accept(&self, sheet_name: &str) -> bool {
        match &self.sheet_name_patterns {
            Some(patterns) => patterns.iter().any(|pattern| pattern.matches(sheet_name)),
            None => true,
        }
    }

    /// Picks a sheet index: the first accepted name in workbook order when patterns
    /// are given, otherwise the active sheet.
    pub(crate) fn select(&self, sheet_names: &[String], active: usize) -> Option<usize> {
        if self.sheet_name_patterns.is_some() {
            sheet_names.iter().position(|name| self.accept(name))
        } else if active < sheet_names.len() {
            Some(active)
        } else if sheet_names.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}
