use pretty_assertions::assert_eq;
use rust_xlsxwriter::Color;
use rust_xlsxwriter::Format;
use rust_xlsxwriter::FormatBorder;
use rust_xlsxwriter::Workbook;
use rust_xlsxwriter::XlsxError;
use rusty_tables::config::Config;
use rusty_tables::pipeline::run;
use rusty_tables::pipeline::Backup;
use rusty_tables::pipeline::RunOptions;
use rusty_tables::spreadsheet::cell::CellValue;
use rusty_tables::spreadsheet::criteria::Criteria;
use rusty_tables::spreadsheet::xlsx::XlsxSpreadsheet;
use rusty_tables::spreadsheet::Spreadsheet;
use rusty_tables::tables::extract_tables;
use rusty_tables::tables::reconstruct::Labels;
use rusty_tables::tables::TableError;
use rusty_tables::RustyTablesError;
use std::path::Path;

fn separator() -> Format {
    Format::new().set_background_color(Color::RGB(0xF2F2F2))
}

fn header() -> Format {
    Format::new().set_background_color(Color::RGB(0x003366)).set_font_color(Color::White)
}

fn entry() -> Format {
    separator()
}

fn calculation() -> Format {
    Format::new().set_background_color(Color::RGB(0xFFFF99))
}

fn linked_entry() -> Format {
    Format::new().set_background_color(Color::RGB(0xFFCC00))
}

fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_owned())
}

/// Two stacked tables on the active sheet, with a decoy sheet in front of it:
///
/// ```text
/// 1  [sep]  [sep]  [sep]
/// 2         ID     Name      <- header
/// 3         1      Alice
/// 4         2      Bob
/// 5  [sep]  [sep]  [sep]
/// 6         X                <- header
/// 7         9
/// ```
fn two_tables() -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    workbook.add_worksheet().set_name("Notes")?.write_string(0, 0, "not this one")?;

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Data")?;
    for col in 0..3 {
        worksheet.write_blank(0, col, &separator())?;
        worksheet.write_blank(4, col, &separator())?;
    }
    worksheet.write_string_with_format(1, 1, "ID", &header())?;
    worksheet.write_string_with_format(1, 2, "Name", &header())?;
    worksheet.write_string_with_format(2, 1, "1", &entry())?;
    worksheet.write_string_with_format(2, 2, "Alice", &entry())?;
    worksheet.write_string_with_format(3, 1, "2", &entry())?;
    worksheet.write_string_with_format(3, 2, "Bob", &entry())?;
    worksheet.write_string_with_format(5, 1, "X", &header())?;
    worksheet.write_string_with_format(6, 1, "9", &entry())?;
    worksheet.set_active(true);

    workbook.save_to_buffer()
}

/// One table with a two-level row index and formula cells:
///
/// ```text
/// 1  Region  Code  Total          <- header
/// 2  North   N1    =SUM(D2:E2)    (calculation)
/// 3  South   S1    =Sheet2!B4     (linked entry)
/// ```
fn row_index_table() -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (col, name) in ["Region", "Code", "Total"].into_iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header())?;
    }
    worksheet.write_string_with_format(1, 0, "North", &entry())?;
    worksheet.write_string_with_format(1, 1, "N1", &entry())?;
    worksheet.write_formula_with_format(1, 2, "=SUM(D2:E2)", &calculation())?;
    worksheet.write_string_with_format(2, 0, "South", &entry())?;
    worksheet.write_string_with_format(2, 1, "S1", &entry())?;
    worksheet.write_formula_with_format(2, 2, "=Sheet2!B4", &linked_entry())?;
    workbook.save_to_buffer()
}

#[test]
fn end_to_end_scenario() -> Result<(), RustyTablesError> {
    let mut spreadsheet = XlsxSpreadsheet::from_bytes("two_tables.xlsx", two_tables()?)?;
    let sheet = spreadsheet.read_sheet(&Criteria::default())?;
    assert_eq!(sheet.name, "Data");
    assert_eq!((sheet.rows(), sheet.cols()), (7, 3));

    let tables = extract_tables(&sheet, &Config::default())?;
    let regions: Vec<(usize, usize)> = tables.iter().map(|table| (table.region.start, table.region.end)).collect();
    assert_eq!(regions, vec![(2, 4), (6, 7)]);

    let table = &tables[0];
    assert_eq!(table.data, vec![vec![text("1"), text("Alice")], vec![text("2"), text("Bob")]]);
    assert_eq!(table.column_labels, Labels::Levels(vec![vec![text("ID"), text("Name")]]));
    assert_eq!(table.row_labels, Labels::Positional(2));
    assert_eq!(table.header_info.row_depth(), 1);
    assert_eq!(table.header_info.col_depth(), 1);

    let table = &tables[1];
    assert_eq!(table.data, vec![vec![text(""), text("9"), text("")]]);
    assert_eq!(table.column_labels, Labels::Levels(vec![vec![text(""), text("X"), text("")]]));
    assert_eq!(table.row_labels, Labels::Positional(1));
    Ok(())
}

#[test]
fn row_index_and_formulas() -> Result<(), RustyTablesError> {
    let mut spreadsheet = XlsxSpreadsheet::from_bytes("row_index.xlsx", row_index_table()?)?;
    let sheet = spreadsheet.read_sheet(&Criteria::default())?;
    assert_eq!(sheet.cell(2, 3).value, CellValue::Formula("=SUM(D2:E2)".to_owned()));

    let tables = extract_tables(&sheet, &Config::default())?;
    assert_eq!(tables.len(), 1);
    let table = &tables[0];
    assert_eq!(table.header_info.col_depth(), 2);
    assert_eq!(table.data, vec![vec![text("SUM(D2:E2)")], vec![text("Sheet2!B4")]]);
    assert_eq!(table.column_labels, Labels::Levels(vec![vec![text("Total")]]));
    assert_eq!(
        table.row_labels,
        Labels::Levels(vec![vec![text("North"), text("South")], vec![text("N1"), text("S1")]])
    );
    Ok(())
}

#[test]
fn bordered_blank_rows_do_not_separate() -> Result<(), RustyTablesError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bordered = separator().set_border(FormatBorder::Thin);
    worksheet.write_string_with_format(0, 0, "a", &entry())?;
    worksheet.write_blank(1, 0, &bordered)?;
    worksheet.write_string_with_format(2, 0, "b", &entry())?;
    let bytes = workbook.save_to_buffer()?;

    let sheet = XlsxSpreadsheet::from_bytes("bordered.xlsx", bytes)?.read_sheet(&Criteria::default())?;
    let tables = extract_tables(&sheet, &Config::default())?;
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].height(), 3);
    Ok(())
}

fn read_output(path: &Path) -> Result<Vec<(usize, usize, String)>, RustyTablesError> {
    let mut spreadsheet = XlsxSpreadsheet::open(&path.to_string_lossy())?;
    assert_eq!(spreadsheet.sheet_names(), vec!["ParsedTables"]);
    let sheet = spreadsheet.read_sheet(&Criteria::default())?;
    let mut cells = Vec::new();
    for row in 1..=sheet.rows() {
        for cell in sheet.row(row) {
            if !cell.value.is_blank() {
                cells.push((cell.row, cell.col, cell.value.to_string()));
            }
        }
    }
    Ok(cells)
}

#[test]
fn run_writes_backup_and_output() -> Result<(), RustyTablesError> {
    let directory = tempfile::tempdir()?;
    let input = directory.path().join("Test_Data_v1.xlsx");
    let output = directory.path().join("parsed_tables.xlsx");
    let bytes = two_tables()?;
    std::fs::write(&input, &bytes)?;

    let summary = run(&RunOptions::new(&input, &output), &Config::default())?;
    assert_eq!(summary.sheet_name, "Data");
    assert_eq!(summary.regions, 2);
    assert_eq!(summary.tables_written, 2);
    assert_eq!(summary.rows_written, 3);
    assert_eq!(summary.output, output);

    let backup = directory.path().join("Test_Data_v1_clone.xlsx");
    assert_eq!(summary.backup.as_deref(), Some(backup.as_path()));
    assert_eq!(std::fs::read(&backup)?, bytes);

    let expected = vec![
        (1, 1, "1".to_owned()),
        (1, 2, "Alice".to_owned()),
        (2, 1, "2".to_owned()),
        (2, 2, "Bob".to_owned()),
        (8, 2, "9".to_owned()),
    ];
    assert_eq!(read_output(&output)?, expected);
    Ok(())
}

#[test]
fn run_with_options() -> Result<(), RustyTablesError> {
    let directory = tempfile::tempdir()?;
    let input = directory.path().join("book.xlsx");
    let output = directory.path().join("out.xlsx");
    std::fs::write(&input, two_tables()?)?;

    let config = Config::from_toml("[export]\nspacing = 0")?;
    let mut options = RunOptions::new(&input, &output);
    options.sheets = vec!["Da*".to_owned()];
    options.backup = Backup::Disabled;

    let summary = run(&options, &config)?;
    assert_eq!(summary.backup, None);
    assert!(!directory.path().join("book_clone.xlsx").exists());
    let cells = read_output(&output)?;
    assert_eq!(cells.last(), Some(&(5, 2, "9".to_owned())));

    options.sheets = vec!["Notes".to_owned()];
    let summary = run(&options, &config)?;
    assert_eq!(summary.sheet_name, "Notes");
    assert_eq!(read_output(&output)?, vec![]);
    Ok(())
}

#[test]
fn strict_formulas_abort_the_run() -> Result<(), RustyTablesError> {
    let mut workbook = Workbook::new();
    workbook.add_worksheet().write_number_with_format(0, 0, 42, &calculation())?;
    let directory = tempfile::tempdir()?;
    let input = directory.path().join("numbers.xlsx");
    let output = directory.path().join("out.xlsx");
    workbook.save(&input)?;

    let mut options = RunOptions::new(&input, &output);
    options.backup = Backup::Disabled;
    let mut config = Config::default();
    run(&options, &config)?;
    assert_eq!(read_output(&output)?, vec![(1, 1, "42".to_owned())]);

    config.formula.strict = true;
    std::fs::remove_file(&output)?;
    let result = run(&options, &config);
    assert!(matches!(
        result,
        Err(RustyTablesError::TableError(TableError::MissingFormulaMarker { .. }))
    ));
    assert!(!output.exists());
    Ok(())
}

#[test]
fn missing_sheet_and_bad_input() -> Result<(), RustyTablesError> {
    let directory = tempfile::tempdir()?;
    let input = directory.path().join("book.xlsx");
    std::fs::write(&input, two_tables()?)?;
    let mut options = RunOptions::new(&input, directory.path().join("out.xlsx"));
    options.sheets = vec!["Budget*".to_owned()];
    assert!(run(&options, &Config::default()).is_err());

    let csv = directory.path().join("book.csv");
    std::fs::write(&csv, "a,b\n")?;
    let mut options = RunOptions::new(&csv, directory.path().join("out.xlsx"));
    options.backup = Backup::Disabled;
    assert!(run(&options, &Config::default()).is_err());
    Ok(())
}
