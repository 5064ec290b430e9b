use crate::error::RustyTablesError;
use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

/// Leading bytes of an OLE compound file (encrypted OOXML packages and legacy .xls)
const COMPOUND_FILE_SIGNATURE: [u8; 4] = [0xD0, 0xCF, 0x11, 0xE0];

/// Leading bytes of a ZIP local file header
const ZIP_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

#[derive(Error, Debug)]
pub enum UnifiedReaderError {
    #[error("No data in source '{0}'")]
    EmptySourceError(String),

    #[error("Cannot derive a backup path for '{0}'")]
    BackupPathError(String),

    #[error("Backup target '{0}' is the source workbook itself")]
    BackupOverwritesSource(String),
}

/// Container format detected from the first bytes of a source.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum Container {
    Zip,
    CompoundFile,
    Unknown,
}

/// A reader over either a local file or an in-memory buffer
pub(crate) enum UnifiedReader {
    /// Local file reader
    Local(BufReader<File>),
    /// In-memory workbook bytes
    Memory(Cursor<Vec<u8>>),
}

impl UnifiedReader {
    /// Opens a local file.
    pub(crate) fn new(file_name: &str) -> Result<UnifiedReader, RustyTablesError> {
        let file = File::open(file_name)?;
        if file.metadata()?.len() == 0 {
            Err(UnifiedReaderError::EmptySourceError(file_name.to_owned()))?;
        }
        Ok(UnifiedReader::Local(BufReader::new(file)))
    }

    /// Wraps workbook bytes already held in memory.
    pub(crate) fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<UnifiedReader, RustyTablesError> {
        if bytes.is_empty() {
            Err(UnifiedReaderError::EmptySourceError(name.to_owned()))?;
        }
        Ok(UnifiedReader::Memory(Cursor::new(bytes)))
    }

    /// Sniffs the container signature and rewinds to the start.
    pub(crate) fn container(&mut self) -> Result<Container, RustyTablesError> {
        let mut signature = [0u8; 4];
        let mut filled = 0usize;
        while filled < signature.len() {
            let count = self.read(&mut signature[filled..])?;
            if count == 0 {
                break;
            }
            filled += count;
        }
        self.seek(SeekFrom::Start(0))?;
        Ok(match signature {
            _ if filled < signature.len() => Container::Unknown,
            ZIP_SIGNATURE => Container::Zip,
            COMPOUND_FILE_SIGNATURE => Container::CompoundFile,
            _ => Container::Unknown,
        })
    }
}

impl Read for UnifiedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            UnifiedReader::Local(reader) => reader.read(buf),
            UnifiedReader::Memory(reader) => reader.read(buf),
        }
    }
}

impl Seek for UnifiedReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            UnifiedReader::Local(reader) => reader.seek(pos),
            UnifiedReader::Memory(reader) => reader.seek(pos),
        }
    }
}

/// Sibling path used for the untouched copy of a source workbook:
/// `data/Book.xlsx` becomes `data/Book_clone.xlsx`.
pub fn backup_path(source: &Path) -> Result<PathBuf, RustyTablesError> {
    let stem = source
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| UnifiedReaderError::BackupPathError(source.to_string_lossy().to_string()))?;
    let file_name = match source.extension().and_then(|extension| extension.to_str()) {
        Some(extension) => format!("{stem}_clone.{extension}"),
        None => format!("{stem}_clone"),
    };
    Ok(source.with_file_name(file_name))
}

/// Copies the source workbook byte for byte to `target`, which must not be the source.
pub fn backup(source: &Path, target: &Path) -> Result<u64, RustyTablesError> {
    if target == source || (target.exists() && std::fs::canonicalize(target)? == std::fs::canonicalize(source)?) {
        Err(UnifiedReaderError::BackupOverwritesSource(target.to_string_lossy().to_string()))?;
    }
    Ok(std::fs::copy(source, target)?)
}
