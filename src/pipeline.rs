use crate::config::Config;
use crate::error::ResultMessage;
use crate::error::RustyTablesError;
use crate::helpers::reader::backup;
use crate::helpers::reader::backup_path;
use crate::spreadsheet;
use crate::spreadsheet::criteria::Criteria;
use crate::tables::export::export;
use crate::tables::export::SheetWriter;
use crate::tables::export::XlsxSheetWriter;
use crate::tables::extract_tables;
use std::path::PathBuf;
use tracing::info;

/// Where the untouched copy of the source workbook goes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Backup {
    /// `<stem>_clone.<ext>` next to the source
    #[default]
    Sibling,
    To(PathBuf),
    Disabled,
}

#[derive(Clone, Debug)]
pub struct RunOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Sheet name patterns; empty selects the active sheet
    pub sheets: Vec<String>,
    pub backup: Backup,
}

impl RunOptions {
    pub fn new<I: Into<PathBuf>, O: Into<PathBuf>>(input: I, output: O) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            sheets: Vec::new(),
            backup: Backup::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub sheet_name: String,
    pub regions: usize,
    pub tables_written: usize,
    pub rows_written: usize,
    pub backup: Option<PathBuf>,
    pub output: PathBuf,
}

/// Backs up the source, reads one sheet, rebuilds its tables and writes their data to `output`.
pub fn run(options: &RunOptions, config: &Config) -> Result<RunSummary, RustyTablesError> {
    let backup_target = match &options.backup {
        Backup::Sibling => Some(backup_path(&options.input)?),
        Backup::To(path) => Some(path.to_owned()),
        Backup::Disabled => None,
    };
    if let Some(target) = &backup_target {
        let bytes = backup(&options.input, target).with_prefix(&format!("Backup to '{}'", target.display()))?;
        info!(source = %options.input.display(), target = %target.display(), bytes, "source backed up");
    }

    let mut workbook = spreadsheet::open(&options.input)?;
    let criteria = Criteria::with_patterns(options.sheets.as_slice())?;
    let sheet = workbook.read_sheet(&criteria)?;
    info!(file = %workbook.name(), sheet = %sheet.name, "sheet loaded");

    let tables = extract_tables(&sheet, config)?;

    let mut writer = XlsxSheetWriter::new(&options.output, &config.export.sheet_name)?;
    let exported = export(&tables, config.export.spacing, &mut writer)?;
    let output = writer.finish().with_prefix(&format!("Save '{}'", options.output.display()))?;
    info!(output = %output.display(), tables = exported.tables, rows = exported.rows, "run complete");

    Ok(RunSummary {
        sheet_name: sheet.name,
        regions: tables.len(),
        tables_written: exported.tables,
        rows_written: exported.rows,
        backup: backup_target,
        output,
    })
}
