//! Reading and writing documents on disk.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Storage collaborator of the editor session
#[cfg_attr(test, mockall::automock)]
pub trait DocumentIo {
    /// Read a document as text, decoding any byte-order mark
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Write `text` to `path`, replacing any previous content
    fn write(&self, path: &Path, text: &str) -> io::Result<()>;
}

/// Line ending written to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewlineStyle {
    #[default]
    Lf,
    CrLf,
}

impl NewlineStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewlineStyle::Lf => "\n",
            NewlineStyle::CrLf => "\r\n",
        }
    }

    /// Rewrite every line ending in `text` (`\r\n`, `\r` or `\n`) to this style
    pub fn apply(&self, text: &str) -> String {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        match self {
            NewlineStyle::Lf => normalized,
            NewlineStyle::CrLf => normalized.replace('\n', "\r\n"),
        }
    }
}

/// Filesystem-backed [`DocumentIo`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsDocumentIo {
    newline: NewlineStyle,
    atomic: bool,
}

impl FsDocumentIo {
    pub fn new(newline: NewlineStyle, atomic: bool) -> Self {
        Self { newline, atomic }
    }

    pub fn newline(&self) -> NewlineStyle {
        self.newline
    }

    /// Write through a temporary file in the target directory, then rename it
    /// over the target so readers never observe a partial document.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|err| err.error)?;
        Ok(())
    }
}

impl Default for FsDocumentIo {
    fn default() -> Self {
        Self::new(NewlineStyle::Lf, true)
    }
}

impl DocumentIo for FsDocumentIo {
    fn read(&self, path: &Path) -> io::Result<String> {
        let bytes = fs::read(path)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "read document");
        decode_text(bytes)
    }

    fn write(&self, path: &Path, text: &str) -> io::Result<()> {
        let content = self.newline.apply(text);
        if self.atomic {
            self.write_atomic(path, content.as_bytes())?;
        } else {
            fs::write(path, content.as_bytes())?;
        }
        tracing::debug!(path = %path.display(), bytes = content.len(), "wrote document");
        Ok(())
    }
}

/// Decode file content, honouring a leading byte-order mark.
///
/// A UTF-8 BOM is stripped; UTF-16 content is only recognised by its BOM.
/// Anything else must be valid UTF-8.
pub fn decode_text(bytes: Vec<u8>) -> io::Result<String> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return utf8(rest.to_vec());
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return utf16(rest, u16::from_be_bytes);
    }
    utf8(bytes)
}

fn utf8(bytes: Vec<u8>) -> io::Result<String> {
    String::from_utf8(bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

fn utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> io::Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "UTF-16 content has an odd number of bytes",
        ));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

/// Append `.xml` unless the file name already ends with it
pub fn ensure_xml_extension(path: &Path) -> PathBuf {
    if path.to_string_lossy().ends_with(".xml") {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(".xml");
    PathBuf::from(name)
}
