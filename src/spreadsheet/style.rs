//! Cell styles from `xl/styles.xml`: number formats, pattern fills and borders,
//! resolved per `cellXfs` entry so that a cell's `s` attribute indexes straight into them.
use crate::config::ConfigError;
use crate::error::RustyTablesError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use quick_xml::events::Event;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Display;
use std::io::BufRead;
use std::str::FromStr;
use std::sync::OnceLock;

// Element local names in styles.xml
const TAG_CUSTOM_FORMATS: &[u8] = b"numFmts";
const TAG_CUSTOM_FORMAT: &[u8] = b"numFmt";
const TAG_FILLS: &[u8] = b"fills";
const TAG_FILL: &[u8] = b"fill";
const TAG_PATTERN_FILL: &[u8] = b"patternFill";
const TAG_FOREGROUND_COLOR: &[u8] = b"fgColor";
const TAG_BACKGROUND_COLOR: &[u8] = b"bgColor";
const TAG_BORDERS: &[u8] = b"borders";
const TAG_BORDER: &[u8] = b"border";
const TAG_FORMAT_INDEXES: &[u8] = b"cellXfs";
const TAG_FORMAT_INDEX: &[u8] = b"xf";

/// An opaque ARGB colour such as `FFF2F2F2`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Argb(pub u32);

fn color_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?:#)?([0-9A-Fa-f]{2})?([0-9A-Fa-f]{6})$").expect("Hardcode regex pattern"))
}

impl FromStr for Argb {
    type Err = ConfigError;

    /// Accepts `RRGGBB` (alpha defaults to `FF`) or `AARRGGBB`, optionally prefixed with `#`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(value.to_owned());
        let captures = color_pattern().captures(value.trim()).ok_or_else(invalid)?;
        let alpha = captures
            .get(1)
            .map(|alpha| u32::from_str_radix(alpha.as_str(), 16))
            .transpose()
            .map_err(|_| invalid())?
            .unwrap_or(0xFF);
        let rgb = u32::from_str_radix(&captures[2], 16).map_err(|_| invalid())?;
        Ok(Argb(alpha << 24 | rgb))
    }
}

impl TryFrom<String> for Argb {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Display for Argb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

/// Line style of one border side. `none` is represented by the side being absent.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BorderStyle {
    Hair,
    Thin,
    Medium,
    Thick,
    Double,
    Dotted,
    Dashed,
    DashDot,
    DashDotDot,
    MediumDashed,
    MediumDashDot,
    MediumDashDotDot,
    SlantDashDot,
    /// A style name this reader does not know; still counts as a drawn border
    Unrecognized,
}

impl BorderStyle {
    pub(crate) fn parse(name: &str) -> Option<Self> {
        match name {
            "" | "none" => None,
            "hair" => Some(Self::Hair),
            "thin" => Some(Self::Thin),
            "medium" => Some(Self::Medium),
            "thick" => Some(Self::Thick),
            "double" => Some(Self::Double),
            "dotted" => Some(Self::Dotted),
            "dashed" => Some(Self::Dashed),
            "dashDot" => Some(Self::DashDot),
            "dashDotDot" => Some(Self::DashDotDot),
            "mediumDashed" => Some(Self::MediumDashed),
            "mediumDashDot" => Some(Self::MediumDashDot),
            "mediumDashDotDot" => Some(Self::MediumDashDotDot),
            "slantDashDot" => Some(Self::SlantDashDot),
            _ => Some(Self::Unrecognized),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Border {
    pub left: Option<BorderStyle>,
    pub right: Option<BorderStyle>,
    pub top: Option<BorderStyle>,
    pub bottom: Option<BorderStyle>,
}

impl Border {
    /// True when none of the four sides is drawn.
    pub fn is_unstyled(&self) -> bool {
        self.left.is_none() && self.right.is_none() && self.top.is_none() && self.bottom.is_none()
    }
}

/// The resolved style of a `cellXfs` entry.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CellStyle {
    pub number: CellType,
    /// Fill colour, `None` for no fill or a colour given only by theme/index
    pub fill: Option<Argb>,
    pub border: Border,
}

/// Raw `xf` attributes before resolution
struct FormatIndex {
    number_format_id: String,
    fill_id: usize,
    border_id: usize,
}

/// Parses styles.xml into one `CellStyle` per `cellXfs` entry.
pub(crate) fn parse_styles<R: BufRead>(reader: &mut XmlReader<R>, is_1904: bool) -> Result<Vec<CellStyle>, RustyTablesError> {
    let mut custom_formats = HashMap::<String, CellType>::new();
    let mut fills = Vec::<Option<Argb>>::new();
    let mut borders = Vec::<Border>::new();
    let mut format_indexes = Vec::<FormatIndex>::new();

    let mut custom_formats_context = false;
    let mut fills_context = false;
    let mut borders_context = false;
    let mut format_indexes_context = false;

    // Current fill: (pattern type, foreground, background)
    let mut fill: Option<(Option<String>, Option<Argb>, Option<Argb>)> = None;
    let mut border: Option<Border> = None;

    match_xml_events!(reader => {
        Event::Start(event) => match event.local_name().as_ref() {
            TAG_CUSTOM_FORMATS => custom_formats_context = true,
            TAG_CUSTOM_FORMAT if custom_formats_context => {
                let id = event.get_attribute_value("numFmtId")?;
                let format = event.get_attribute_value("formatCode")?;
                if let Some((id, format)) = id.zip(format) {
                    custom_formats.insert(id.to_string(), CellType::parse_custom_number_format(&format, is_1904));
                }
            }
            TAG_FILLS => fills_context = true,
            TAG_FILL if fills_context => fill = Some((None, None, None)),
            TAG_PATTERN_FILL if fills_context => {
                let pattern_type = event.get_attribute_value("patternType")?.map(|value| value.to_string());
                if let Some(fill) = fill.as_mut() {
                    fill.0 = pattern_type;
                }
            }
            TAG_FOREGROUND_COLOR if fills_context => {
                let color = parse_color(event.get_attribute_value("rgb")?.as_deref());
                if let Some(fill) = fill.as_mut() {
                    fill.1 = color;
                }
            }
            TAG_BACKGROUND_COLOR if fills_context => {
                let color = parse_color(event.get_attribute_value("rgb")?.as_deref());
                if let Some(fill) = fill.as_mut() {
                    fill.2 = color;
                }
            }
            TAG_BORDERS => borders_context = true,
            TAG_BORDER if borders_context => border = Some(Border::default()),
            side @ (b"left" | b"start" | b"right" | b"end" | b"top" | b"bottom") if borders_context => {
                let style = event.get_attribute_value("style")?.and_then(|style| BorderStyle::parse(&style));
                if let Some(border) = border.as_mut() {
                    match side {
                        b"left" | b"start" => border.left = style,
                        b"right" | b"end" => border.right = style,
                        b"top" => border.top = style,
                        _ => border.bottom = style,
                    }
                }
            }
            TAG_FORMAT_INDEXES => format_indexes_context = true,
            TAG_FORMAT_INDEX if format_indexes_context => {
                format_indexes.push(FormatIndex {
                    number_format_id: event.get_attribute_value("numFmtId")?.map(|id| id.to_string()).unwrap_or_default(),
                    fill_id: event.parse_attribute_value("fillId")?.unwrap_or(0),
                    border_id: event.parse_attribute_value("borderId")?.unwrap_or(0),
                });
            }
            _ => (),
        },
        Event::End(event) => match event.local_name().as_ref() {
            TAG_CUSTOM_FORMATS => custom_formats_context = false,
            TAG_FILLS => fills_context = false,
            TAG_FILL if fills_context => {
                let color = fill.take().and_then(|(pattern_type, foreground, background)| {
                    if pattern_type.as_deref() == Some("none") {
                        None
                    } else {
                        foreground.or(background)
                    }
                });
                fills.push(color);
            }
            TAG_BORDERS => borders_context = false,
            TAG_BORDER if borders_context => borders.push(border.take().unwrap_or_default()),
            TAG_FORMAT_INDEXES => format_indexes_context = false,
            _ => (),
        },
    });

    Ok(format_indexes
        .into_iter()
        .map(|index| CellStyle {
            number: resolve_number_format(&index.number_format_id, &custom_formats, is_1904),
            fill: fills.get(index.fill_id).copied().flatten(),
            border: borders.get(index.border_id).copied().unwrap_or_default(),
        })
        .collect())
}

/// Maps a format id to a cell type using custom formats first, then the built-in table.
fn resolve_number_format(id: &str, custom_formats: &HashMap<String, CellType>, is_1904: bool) -> CellType {
    custom_formats
        .get(id)
        .copied()
        .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
        .unwrap_or(CellType::Number)
}

/// Only explicit `rgb` colours are recognised; malformed values count as no colour.
fn parse_color(rgb: Option<&str>) -> Option<Argb> {
    rgb.and_then(|rgb| rgb.parse().ok())
}
