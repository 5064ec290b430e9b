//! XML reading utilities for the OOXML parts of a workbook.
//! Wraps `quick_xml::Reader` with a reusable buffer and adds attribute/text helpers.

use crate::error::RustyTablesError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

/// Errors specific to XML parsing operations
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Parse entity '{0}' failed")]
    ParseEntityError(String),

    #[error("Parse attribute value '{0}' failed")]
    ParseAttributeValueError(String),
}

/// XML reader configured for workbook parts.
///
/// Empty elements are expanded into start/end pairs, so `<c r="A1" s="3"/>`
/// is seen exactly like `<c r="A1" s="3"></c>` by the event loops.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    /// Wraps a buffered part reader; comment and end-name checks are off, text is not trimmed.
    pub(crate) fn new(buf_reader: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(buf_reader);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);

        let buffer = Vec::with_capacity(1024);
        XmlReader { reader, buffer }
    }

    /// Reads the next XML event, `None` at end of document.
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, RustyTablesError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer) {
            Ok(Event::Eof) => Ok(None),
            Ok(event) => Ok(Some(event)),
            Err(error) => Err(RustyTablesError::XmlError(error)),
        }
    }
}

/// Value extraction for a single XML attribute.
pub(crate) trait XmlAttributeHelper<'a> {
    /// The attribute value with entities resolved.
    fn get_value(&self) -> Result<Cow<'a, str>, RustyTablesError>;

    /// The attribute value parsed with `FromStr`; a failure reports the raw value.
    fn parse_value<T: FromStr>(&self) -> Result<T, RustyTablesError>;
}

impl<'a> XmlAttributeHelper<'a> for Attribute<'a> {
    fn get_value(&self) -> Result<Cow<'a, str>, RustyTablesError> {
        Ok(self.unescape_value()?)
    }

    fn parse_value<T: FromStr>(&self) -> Result<T, RustyTablesError> {
        self.get_value()?
            .parse()
            .map_err(|_| match std::str::from_utf8(&self.value) {
                Ok(value) => RustyTablesError::XmlHelperError(XmlError::ParseAttributeValueError(value.to_string())),
                Err(error) => RustyTablesError::StringEncodingError(error),
            })
    }
}

/// Attribute lookup by name on a start tag.
pub(crate) trait XmlNodeHelper<'a> {
    /// Looks up an attribute by its qualified name, `None` when the tag does not carry it.
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, RustyTablesError>;

    /// Looks up an attribute and parses its value, `None` when the tag does not carry it.
    fn parse_attribute_value<T: FromStr>(&self, name: &str) -> Result<Option<T>, RustyTablesError>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, RustyTablesError> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute.get_value())
            .transpose()
    }

    fn parse_attribute_value<T: FromStr>(&self, name: &str) -> Result<Option<T>, RustyTablesError> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute.parse_value())
            .transpose()
    }
}

/// Accumulates element text, resolving entity and character references.
pub(crate) trait XmlTextContextHelper {
    /// Appends a text event's decoded content.
    fn push_bytes_text(&mut self, text: &BytesText) -> Result<(), RustyTablesError>;

    /// Appends the character behind `&name;`, `&#NN;` or `&#xHH;`.
    /// Unknown entity names are an error.
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), RustyTablesError>;
}

impl XmlTextContextHelper for String {
    fn push_bytes_text(&mut self, text: &BytesText) -> Result<(), RustyTablesError> {
        self.push_str(&text.xml_content()?);
        Ok(())
    }

    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), RustyTablesError> {
        let raw = bytes.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = if let Some(hex) = number.strip_prefix('x') {
                u32::from_str_radix(hex, 16)?
            } else {
                number.parse::<u32>()?
            };
            if let Some(character) = std::char::from_u32(code) {
                self.push(character);
            }
        } else if let Some(entity) = resolve_xml_entity(&raw) {
            self.push_str(entity);
        } else {
            Err(XmlError::ParseEntityError(raw.to_string()))?;
        }

        Ok(())
    }
}

/// Drives an `XmlReader` to the end of the document, dispatching each event to the given arms.
/// Unmatched events are skipped; `break` inside an arm stops reading early.
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(result) = $reader.next()? {
            match result {
                Event::Eof => break,
                $($arms)*
                _ => (),
            }
        }
    };
}
