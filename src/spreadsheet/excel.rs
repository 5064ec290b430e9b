//! Office Open XML package helpers shared by the workbook readers
use crate::error::RustyTablesError;
use crate::helpers::reader::Container;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use std::borrow::Cow;
use std::collections::HashMap;
use zip::ZipArchive;

/// XML tag name for relationship elements
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// Workbook-level facts read from `xl/workbook.xml`
pub(crate) struct WorkbookInfo {
    /// (sheet name, zip path) in workbook order
    pub(crate) sheets: Vec<(String, String)>,
    /// Index of the active sheet
    pub(crate) active: usize,
    /// Whether the workbook uses the 1904 date system
    pub(crate) is_1904: bool,
}

/// Opens an OOXML package and loads its workbook structure.
///
/// # Arguments
/// * `file_name` - Name used in error messages
/// * `reader` - Source of the package bytes
/// * `load_workbook` - Reads sheet list, active sheet and date system
///
/// # Returns
/// The zip archive handle together with the workbook info
pub(super) fn open<W>(
    file_name: &str,
    mut reader: UnifiedReader,
    load_workbook: W,
) -> Result<(ZipArchive<UnifiedReader>, WorkbookInfo), RustyTablesError>
where
    W: Fn(&mut ZipArchive<UnifiedReader>) -> Result<WorkbookInfo, RustyTablesError>,
{
    match reader.container()? {
        Container::Zip => (),
        Container::CompoundFile => Err(SpreadsheetError::SpreadsheetPasswordProtectedError(file_name.to_owned()))?,
        Container::Unknown => Err(SpreadsheetError::InvalidFileFormat(file_name.to_owned()))?,
    }

    let mut zip = ZipArchive::new(reader)?;
    let workbook = load_workbook(&mut zip)?;
    if workbook.sheets.is_empty() {
        Err(SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?
    }
    Ok((zip, workbook))
}

/// Loads worksheet relationships: relationship id to worksheet part path.
pub(super) fn load_relationships(zip: &mut ZipArchive<UnifiedReader>, path: &str) -> Result<HashMap<String, String>, RustyTablesError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_string()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Normalizes a relationship target to a path inside the archive.
pub(crate) fn to_zip_path(path: Cow<'_, str>) -> String {
    if let Some(path) = path.strip_prefix('/') {
        path.to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}
