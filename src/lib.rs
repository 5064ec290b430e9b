//! # Rusty Tables
//!
//! Reads one sheet of an Excel workbook that stacks several logical tables, separated by
//! styled blank rows and labelled by header cells recognised only from their fill colour, and
//! rebuilds each table with its multi-level row and column labels. The data blocks of all
//! tables are then written into a single output sheet, a fixed number of rows apart.
//!
//! ## Styling convention
//!
//! | Fill (default) | Meaning |
//! |---|---|
//! | `FFF2F2F2` | blank and borderless: separator; otherwise a plain entry |
//! | `FF003366` | header cell |
//! | `FFFFFF99` | calculated cell, formula text kept without its `=` |
//! | `FFFFCC00` | linked entry, treated like a calculated cell |
//!
//! Any other cell is blanked. The colours, the formula marker and the export spacing come
//! from [`config::Config`].
//!
//! ## Example
//!
//! ```no_run
//! use rusty_tables::config::Config;
//! use rusty_tables::pipeline::{run, RunOptions};
//!
//! let summary = run(&RunOptions::new("Test_Data_v1.xlsx", "parsed_tables.xlsx"), &Config::default())?;
//! println!("{} tables written", summary.tables_written);
//! # Ok::<(), rusty_tables::error::RustyTablesError>(())
//! ```
pub mod config;
pub mod error;
pub mod helpers;
pub mod pipeline;
pub mod spreadsheet;
pub mod tables;

pub use crate::config::Config;
pub use crate::error::RustyTablesError;
pub use crate::pipeline::run;
pub use crate::pipeline::RunOptions;
pub use crate::pipeline::RunSummary;
pub use crate::tables::extract_tables;
pub use crate::tables::reconstruct::ReconstructedTable;
