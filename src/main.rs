use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use rusty_tables::config::Config;
use rusty_tables::pipeline::run;
use rusty_tables::pipeline::Backup;
use rusty_tables::pipeline::RunOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Split a colour-coded sheet into its stacked tables and write their data to one sheet.")]
struct Args {
    /// Source workbook (.xlsx or .xlsm).
    input: PathBuf,

    /// Output workbook.
    #[arg(short, long, default_value = "parsed_tables.xlsx")]
    output: PathBuf,

    /// Glob pattern selecting the sheet to read (repeatable); the active sheet by default.
    #[arg(long = "sheet")]
    sheets: Vec<String>,

    /// TOML file with palette, formula and export settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Blank rows between exported tables, overriding the config file.
    #[arg(long)]
    spacing: Option<usize>,

    /// Do not copy the source workbook before reading it.
    #[arg(long, conflicts_with = "backup")]
    no_backup: bool,

    /// Backup path, `<stem>_clone.<ext>` next to the input by default.
    #[arg(long)]
    backup: Option<PathBuf>,

    /// Fail when a formula-coloured cell does not start with the formula marker.
    #[arg(long)]
    strict_formulas: bool,

    /// Log per-table details.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn init_logging(&self) {
        let level = if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("rusty_tables={level}")));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path).with_context(|| format!("Failed to load config '{}'", path.display()))?,
            None => Config::default(),
        };
        if let Some(spacing) = self.spacing {
            config.export.spacing = spacing;
        }
        if self.strict_formulas {
            config.formula.strict = true;
        }
        Ok(config)
    }

    fn run_options(&self) -> RunOptions {
        let backup = match (&self.backup, self.no_backup) {
            (_, true) => Backup::Disabled,
            (Some(path), false) => Backup::To(path.to_owned()),
            (None, false) => Backup::Sibling,
        };
        RunOptions {
            input: self.input.to_owned(),
            output: self.output.to_owned(),
            sheets: self.sheets.to_owned(),
            backup,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    args.init_logging();

    let config = args.load_config()?;
    let options = args.run_options();
    let summary = run(&options, &config)
        .with_context(|| format!("Failed to process '{}'", options.input.display()))?;

    println!(
        "{} table(s), {} data row(s) from sheet '{}' written to {}",
        summary.tables_written,
        summary.rows_written,
        summary.sheet_name,
        summary.output.display()
    );
    Ok(())
}
