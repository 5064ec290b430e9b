use crate::error::RustyTablesError;
use crate::error::ResultMessage;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::excel;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::excel::WorkbookInfo;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::range_upper_bound;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::reference::shift_references;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::style::parse_styles;
use crate::spreadsheet::style::CellStyle;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use quick_xml::events::Event;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;
use tracing::debug;
use zip::ZipArchive;

// Element local names in the workbook, shared strings and worksheet parts
const TAG_SHARED_STRING_ITEM: &[u8] = b"si"; // Shared string table item
const TAG_PHONETIC_TEXT: &[u8] = b"rPh"; // Phonetic text for Asian languages
const TAG_TEXT: &[u8] = b"t"; // Text content within strings
const TAG_WORKBOOK_PROPERTIES: &[u8] = b"workbookPr";
const TAG_WORKBOOK_VIEW: &[u8] = b"workbookView";
const TAG_SHEET: &[u8] = b"sheet";
const TAG_DIMENSION: &[u8] = b"dimension";
const TAG_ROW: &[u8] = b"row";
const TAG_CELL: &[u8] = b"c";
const TAG_INLINE_STRING: &[u8] = b"is";
const TAG_VALUE: &[u8] = b"v";
const TAG_FORMULA: &[u8] = b"f";

/// An Excel workbook in Office Open XML format
pub struct XlsxSpreadsheet {
    /// File name of the spreadsheet
    pub(crate) name: String,
    /// ZIP archive containing the package parts
    zip: ZipArchive<UnifiedReader>,
    /// Resolved styles indexed by a cell's `s` attribute
    styles: Vec<CellStyle>,
    /// Sheet list, active sheet and date system
    workbook: WorkbookInfo,
}

impl XlsxSpreadsheet {
    /// Opens an XLSX/XLSM file from a local path.
    pub fn open(file_name: &str) -> Result<XlsxSpreadsheet, RustyTablesError> {
        let reader = UnifiedReader::new(file_name)?;
        Self::from_reader(file_name, reader)
    }

    /// Opens workbook bytes already in memory, e.g. a freshly generated workbook.
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<XlsxSpreadsheet, RustyTablesError> {
        let reader = UnifiedReader::from_bytes(name, bytes)?;
        Self::from_reader(name, reader)
    }

    fn from_reader(name: &str, reader: UnifiedReader) -> Result<XlsxSpreadsheet, RustyTablesError> {
        let (mut zip, workbook) = excel::open(name, reader, load_workbook)?;
        let styles = load_styles(&mut zip, workbook.is_1904).with_prefix("xl/styles.xml")?;
        Ok(XlsxSpreadsheet {
            name: name.to_owned(),
            zip,
            styles,
            workbook,
        })
    }

    /// Loads the whole shared string table; empty when the part is absent.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, RustyTablesError> {
        let mut shared_strings = Vec::<String>::new();
        let mut reader = match self.zip.xml_reader("xl/sharedStrings.xml")? {
            Some(reader) => reader,
            None => return Ok(shared_strings),
        };
        match_xml_events!(reader => {
            Event::Start(event) if event.local_name().as_ref() == TAG_SHARED_STRING_ITEM => {
                shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
            }
        });
        Ok(shared_strings)
    }
}

impl Spreadsheet for XlsxSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    /// Reads every recorded cell of the selected worksheet, styled blanks included.
    fn read_sheet(&mut self, criteria: &Criteria) -> Result<Sheet, RustyTablesError> {
        let index = criteria
            .select(&self.sheet_names(), self.workbook.active)
            .ok_or_else(|| SpreadsheetError::SheetNotFound(self.name.to_owned()))?;
        let (sheet_name, zip_path) = self.workbook.sheets[index].clone();
        let shared_strings = self.load_shared_strings().with_prefix("xl/sharedStrings.xml")?;
        debug!(sheet = %sheet_name, part = %zip_path, shared_strings = shared_strings.len(), "reading worksheet");

        let mut sheet = Sheet::new(&self.name, &sheet_name);
        let mut reader = self.zip.xml_reader(&zip_path)?
            .ok_or_else(|| SpreadsheetError::FileError(zip_path.to_owned()))?;

        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind: Option<String> = None;
        let mut style = CellStyle::default();
        let mut value: Option<String> = None;
        let mut formula: Option<String> = None;
        // shared formula index -> master cell and its text
        let mut shared_formulas: HashMap<String, (usize, usize, String)> = HashMap::new();
        match_xml_events!(reader => {
            Event::Start(event) if event.local_name().as_ref() == TAG_DIMENSION => {
                if let Some((rows, cols)) = event.get_attribute_value("ref")?.and_then(|range| range_upper_bound(&range)) {
                    sheet.extend_to(rows, cols);
                }
            }
            Event::Start(event) if event.local_name().as_ref() == TAG_ROW => {
                row_count = event.parse_attribute_value::<usize>("r")?.unwrap_or(row_count + 1);
                col_count = 0;
            }
            Event::Start(event) if event.local_name().as_ref() == TAG_CELL => {
                (row, col) = event.get_attribute_value("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((row_count, col_count + 1));
                col_count = col;
                kind = event.get_attribute_value("t")?.map(|t| t.to_string());
                style = match event.parse_attribute_value::<usize>("s")? {
                    Some(index) => self.styles.get(index).copied().unwrap_or_default(),
                    None => self.styles.first().copied().unwrap_or_default(),
                };
                value = None;
                formula = None;
            }
            Event::Start(event) if event.local_name().as_ref() == TAG_INLINE_STRING => {
                value = Some(read_string_value(&mut reader, TAG_INLINE_STRING, false)?);
            }
            Event::Start(event) if event.local_name().as_ref() == TAG_VALUE => {
                value = Some(read_string_value(&mut reader, TAG_VALUE, true)?);
            }
            Event::Start(event) if event.local_name().as_ref() == TAG_FORMULA => {
                let shared_index = match event.get_attribute_value("t")? {
                    Some(kind) if kind == "shared" => event.get_attribute_value("si")?.map(Cow::into_owned),
                    _ => None,
                };
                let text = read_string_value(&mut reader, TAG_FORMULA, true)?;
                formula = match shared_index {
                    Some(index) if text.is_empty() => shared_formulas.get(&index).map(|(master_row, master_col, master)| {
                        shift_references(master, row as i64 - *master_row as i64, col as i64 - *master_col as i64)
                    }),
                    Some(index) => {
                        shared_formulas.insert(index, (row, col, text.to_owned()));
                        Some(text)
                    }
                    None => Some(text),
                };
            }
            Event::End(event) if event.local_name().as_ref() == TAG_CELL => {
                let cell_value = to_cell_value(kind.as_deref(), value.take(), formula.take(), style.number, &shared_strings)
                    .map_err(|message| SpreadsheetError::CellValueError(
                        sheet.file_name.to_owned(),
                        sheet.name.to_owned(),
                        index_to_reference(row, col),
                        message,
                    ))?;
                sheet.push(Cell { row, col, value: cell_value, style });
            }
        });
        debug!(sheet = %sheet.name, rows = sheet.rows(), cols = sheet.cols(), cells = sheet.cells.len(), "worksheet loaded");
        Ok(sheet)
    }
}

/// Converts the raw parts of a `<c>` element into a value.
///
/// Formula text wins over the cached result so formulas read as `=` followed by their text.
/// Shared-formula dependents arrive here already translated from their master; one whose
/// master was never seen has no text and falls back to the cached value.
fn to_cell_value(
    kind: Option<&str>,
    value: Option<String>,
    formula: Option<String>,
    number: CellType,
    shared_strings: &[String],
) -> Result<CellValue, String> {
    if let Some(formula) = formula.filter(|formula| !formula.is_empty()) {
        return Ok(CellValue::Formula(format!("={formula}")));
    }
    let value = match value {
        Some(value) => value,
        None => return Ok(CellValue::Empty),
    };
    match kind {
        Some("inlineStr") | Some("str") => Ok(CellValue::Text(value)),
        _ if value.is_empty() => Ok(CellValue::Empty),
        Some("s") => value
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|index| shared_strings.get(index))
            .map(|string| CellValue::Text(string.to_owned()))
            .ok_or_else(|| format!("unknown shared string '{value}'")),
        Some("b") => Ok(CellValue::Boolean(value == "1" || value.eq_ignore_ascii_case("true"))),
        Some("e") => Ok(CellValue::Error(value)),
        Some("d") => Ok(parse_iso_datetime(&value)
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Text(value))),
        _ => value
            .trim()
            .parse::<f64>()
            .map(|number_value| CellValue::from_number(number_value, number))
            .map_err(|_| format!("parse '{value}' to number failed")),
    }
}

fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Loads sheet names and paths, the active sheet and the date system from `xl/workbook.xml`.
fn load_workbook(zip: &mut ZipArchive<UnifiedReader>) -> Result<WorkbookInfo, RustyTablesError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("xl/workbook.xml".to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut active = 0usize;
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(&id.to_string()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_WORKBOOK_VIEW => {
            active = event.parse_attribute_value::<usize>("activeTab")?.unwrap_or(0);
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
        }
    });
    Ok(WorkbookInfo { sheets, active, is_1904 })
}

/// Loads cell styles from `xl/styles.xml`; a package without styles gets none.
fn load_styles(zip: &mut ZipArchive<UnifiedReader>, is_1904: bool) -> Result<Vec<CellStyle>, RustyTablesError> {
    match zip.xml_reader("xl/styles.xml")? {
        Some(mut reader) => parse_styles(&mut reader, is_1904),
        None => Ok(Vec::new()),
    }
}

/// Reads string content up to `end_tag`, skipping phonetic annotations.
///
/// # Arguments
/// * `reader` - XML reader positioned just after the opening tag
/// * `end_tag` - Local name of the element that closes the string
/// * `is_text_content` - Whether text directly inside the element counts (`<v>`, `<f>`),
///   rather than only text inside `<t>` runs (`<si>`, `<is>`)
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: &[u8],
    is_text_content: bool,
) -> Result<String, RustyTablesError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.local_name().as_ref() == end_tag => break,
        Event::Start(event) if event.local_name().as_ref() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.local_name().as_ref() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.local_name().as_ref() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.local_name().as_ref() == TAG_TEXT => is_text = is_text_content,
        Event::Text(event) if is_text => text.push_bytes_text(&event)?,
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}
