use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 1-based line and column of a position in a text buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPosition {
    pub line: usize,
    pub column: usize,
}

impl TextPosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Convert a byte offset into `text` to a line/column pair.
    ///
    /// Offsets past the end are clamped to the end of the text, and offsets
    /// inside a multi-byte character are snapped back to its first byte.
    /// Columns count characters, not bytes.
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }

        let before = &text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;

        Self { line, column }
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Well-formedness failure reported by the XML parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub position: Option<TextPosition>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: Option<TextPosition>) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    /// Build an error located at a byte offset of the parsed text
    pub fn at(message: impl Into<String>, text: &str, offset: usize) -> Self {
        Self::new(message, Some(TextPosition::from_offset(text, offset)))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "{} at {}", self.message, position),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// Main application error type that encompasses all possible failure modes
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML is not well-formed: {0}")]
    Parse(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EditorError {
    /// Position of the first well-formedness error, if this is a parse failure
    pub fn position(&self) -> Option<TextPosition> {
        match self {
            EditorError::Parse(err) => err.position,
            _ => None,
        }
    }
}

impl From<crate::config::ConfigError> for EditorError {
    fn from(err: crate::config::ConfigError) -> Self {
        EditorError::Config(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, EditorError>;
