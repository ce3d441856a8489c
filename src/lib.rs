//! # xmledit Library
//!
//! The core of a small XML editor: a tag catalog with prefix completion,
//! well-formedness validation with 1-based error positions, a pretty-printer,
//! BOM-aware document I/O and a headless editor session that never saves a
//! malformed document.

pub mod catalog;
pub mod cli;
pub mod completer;
pub mod config;
pub mod document_io;
pub mod editor;
pub mod error;
pub mod error_reporter;
pub mod output;
pub mod parser;
pub mod pretty;
pub mod validator;

pub use catalog::{DEFAULT_TAGS, TagCatalog};
pub use cli::{Cli, Command, OutputFormat, VerbosityLevel};
pub use completer::{CompletionState, PrefixCompleter, complete, current_word, insertion_delta};
pub use config::{Config, ConfigError, ConfigManager, EnvProvider, SystemEnvProvider};
pub use document_io::{DocumentIo, FsDocumentIo, NewlineStyle, ensure_xml_extension};
pub use editor::{EditorEvent, EditorSession, EventOutcome, SaveOptions};
pub use error::{EditorError, ParseError, Result, TextPosition};
pub use error_reporter::ErrorReporter;
pub use output::Output;
pub use parser::{Element, Node, XmlDocument, parse_document};
pub use pretty::{DEFAULT_INDENT, prettify};
pub use validator::{ValidationResult, XmlValidator, validate};
