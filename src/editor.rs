//! Headless editor session.
//!
//! An [`EditorSession`] owns the document buffer, the caret, the remembered
//! file path and the live completion state. Everything that happens to it
//! arrives as an [`EditorEvent`] through [`EditorSession::handle`], so a UI
//! layer only has to translate its own callbacks into events.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::completer::{CompletionState, PrefixCompleter, snap_to_boundary};
use crate::document_io::{DocumentIo, ensure_xml_extension};
use crate::error::{EditorError, Result};
use crate::pretty::{DEFAULT_INDENT, prettify};
use crate::validator::validate;

/// Something the user did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// The buffer now holds `text`, with the caret at byte offset `caret`
    TextChanged { text: String, caret: usize },
    /// A suggestion from the current completion list was picked
    CompletionChosen { chosen: String },
    /// Save to `path`, or to the remembered path when `None`
    SaveRequested { path: Option<PathBuf> },
    OpenRequested { path: PathBuf },
}

/// What handling an event produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EventOutcome {
    Completions(CompletionState),
    Inserted { caret: usize },
    Saved { path: PathBuf },
    Opened { path: PathBuf },
    /// A save was requested but no path is known yet
    PathRequired,
}

/// How the save pipeline treats the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    pub indent: String,
    pub format_on_save: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT.to_string(),
            format_on_save: true,
        }
    }
}

pub struct EditorSession<I: DocumentIo> {
    io: I,
    completer: PrefixCompleter,
    options: SaveOptions,
    document: String,
    caret: usize,
    current_path: Option<PathBuf>,
    completion: CompletionState,
}

impl<I: DocumentIo> EditorSession<I> {
    pub fn new(io: I, completer: PrefixCompleter, options: SaveOptions) -> Self {
        Self {
            io,
            completer,
            options,
            document: String::new(),
            caret: 0,
            current_path: None,
            completion: CompletionState::default(),
        }
    }

    /// Session with the default catalog and save options
    pub fn with_io(io: I) -> Self {
        Self::new(io, PrefixCompleter::default(), SaveOptions::default())
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    pub fn completion(&self) -> &CompletionState {
        &self.completion
    }

    pub fn options(&self) -> &SaveOptions {
        &self.options
    }

    pub fn io(&self) -> &I {
        &self.io
    }

    /// Dispatch one event.
    ///
    /// A failed action leaves the session as it was before the event, so the
    /// caller can report the error and keep going.
    pub fn handle(&mut self, event: EditorEvent) -> Result<EventOutcome> {
        match event {
            EditorEvent::TextChanged { text, caret } => Ok(self.text_changed(text, caret)),
            EditorEvent::CompletionChosen { chosen } => Ok(self.insert_completion(&chosen)),
            EditorEvent::SaveRequested { path } => self.save(path),
            EditorEvent::OpenRequested { path } => self.open(path),
        }
    }

    fn text_changed(&mut self, text: String, caret: usize) -> EventOutcome {
        self.caret = snap_to_boundary(&text, caret);
        self.document = text;
        self.completion = CompletionState::compute(&self.completer, &self.document, self.caret);
        tracing::debug!(
            prefix = %self.completion.prefix,
            matches = self.completion.matches.len(),
            "completion updated"
        );
        EventOutcome::Completions(self.completion.clone())
    }

    fn insert_completion(&mut self, chosen: &str) -> EventOutcome {
        let delta = self
            .completer
            .insertion_delta(chosen, &self.completion.prefix)
            .to_string();
        self.document.insert_str(self.caret, &delta);
        self.caret += delta.len();
        self.completion = CompletionState::default();
        tracing::debug!(chosen, inserted = %delta, caret = self.caret, "completion inserted");
        EventOutcome::Inserted { caret: self.caret }
    }

    fn save(&mut self, path: Option<PathBuf>) -> Result<EventOutcome> {
        let target = match path.as_deref().map(ensure_xml_extension) {
            Some(target) => target,
            None => match &self.current_path {
                Some(current) => current.clone(),
                None => {
                    tracing::debug!("save requested without a path");
                    return Ok(EventOutcome::PathRequired);
                }
            },
        };

        let validation = validate(&self.document);
        if let Some(error) = validation.to_error() {
            tracing::warn!(path = %target.display(), error = %error, "refusing to save malformed document");
            return Err(EditorError::Parse(error));
        }

        let text = if self.options.format_on_save {
            prettify(&self.document, &self.options.indent)?
        } else {
            self.document.clone()
        };

        self.io
            .write(&target, &text)
            .map_err(|source| EditorError::Save {
                path: target.clone(),
                source,
            })?;

        tracing::info!(path = %target.display(), "document saved");
        self.caret = snap_to_boundary(&text, self.caret);
        self.document = text;
        self.completion = CompletionState::default();
        self.current_path = Some(target.clone());
        Ok(EventOutcome::Saved { path: target })
    }

    fn open(&mut self, path: PathBuf) -> Result<EventOutcome> {
        let text = self.io.read(&path).map_err(|source| EditorError::Open {
            path: path.clone(),
            source,
        })?;

        tracing::info!(path = %path.display(), bytes = text.len(), "document opened");
        self.document = text;
        self.caret = 0;
        self.completion = CompletionState::default();
        self.current_path = Some(path.clone());
        Ok(EventOutcome::Opened { path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_io::MockDocumentIo;
    use std::io;

    fn text_changed(text: &str) -> EditorEvent {
        EditorEvent::TextChanged {
            text: text.to_string(),
            caret: text.len(),
        }
    }

    fn save_to(path: &str) -> EditorEvent {
        EditorEvent::SaveRequested {
            path: Some(PathBuf::from(path)),
        }
    }

    #[test]
    fn test_text_changed_computes_completions() {
        let mut session = EditorSession::with_io(MockDocumentIo::new());

        let outcome = session.handle(text_changed("<root>\n  <it")).unwrap();
        match outcome {
            EventOutcome::Completions(state) => {
                assert_eq!(state.prefix, "<it");
                assert_eq!(state.matches, vec!["<item>"]);
            }
            other => panic!("Expected completions, got {:?}", other),
        }
        assert_eq!(session.caret(), "<root>\n  <it".len());
    }

    #[test]
    fn test_text_changed_clamps_caret() {
        let mut session = EditorSession::with_io(MockDocumentIo::new());
        session
            .handle(EditorEvent::TextChanged {
                text: "<é".to_string(),
                caret: 2,
            })
            .unwrap();
        assert_eq!(session.caret(), 1);

        session
            .handle(EditorEvent::TextChanged {
                text: "<a".to_string(),
                caret: 99,
            })
            .unwrap();
        assert_eq!(session.caret(), 2);
    }

    #[test]
    fn test_completion_inserts_remainder_at_caret() {
        let mut session = EditorSession::with_io(MockDocumentIo::new());
        session
            .handle(EditorEvent::TextChanged {
                text: "<root> <na</root>".to_string(),
                caret: 10,
            })
            .unwrap();

        let outcome = session
            .handle(EditorEvent::CompletionChosen {
                chosen: "<name>".to_string(),
            })
            .unwrap();

        assert_eq!(outcome, EventOutcome::Inserted { caret: 13 });
        assert_eq!(session.document(), "<root> <name></root>");
        assert!(session.completion().is_empty());
    }

    #[test]
    fn test_save_without_path_requires_one() {
        let mut io = MockDocumentIo::new();
        io.expect_write().never();

        let mut session = EditorSession::with_io(io);
        session.handle(text_changed("<a/>")).unwrap();

        let outcome = session
            .handle(EditorEvent::SaveRequested { path: None })
            .unwrap();
        assert_eq!(outcome, EventOutcome::PathRequired);
        assert_eq!(session.current_path(), None);
    }

    #[test]
    fn test_invalid_document_is_never_written() {
        let mut io = MockDocumentIo::new();
        io.expect_write().never();

        let mut session = EditorSession::with_io(io);
        session.handle(text_changed("<a><b></a>")).unwrap();

        let err = session.handle(save_to("/docs/broken.xml")).unwrap_err();
        assert!(matches!(err, EditorError::Parse(_)));
        assert!(err.position().is_some());
        assert_eq!(session.document(), "<a><b></a>");
        assert_eq!(session.current_path(), None);
    }

    #[test]
    fn test_invalid_document_is_not_written_without_formatting() {
        let mut io = MockDocumentIo::new();
        io.expect_write().never();

        let options = SaveOptions {
            format_on_save: false,
            ..SaveOptions::default()
        };
        let mut session = EditorSession::new(io, PrefixCompleter::default(), options);
        session.handle(text_changed("<a>")).unwrap();

        assert!(session.handle(save_to("/docs/a.xml")).is_err());
    }

    #[test]
    fn test_save_prettifies_and_appends_extension() {
        let mut io = MockDocumentIo::new();
        io.expect_write()
            .withf(|path, text| {
                path.ends_with("notes.xml") && text.to_string() == "<root>\n    <item>x</item>\n</root>"
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut session = EditorSession::with_io(io);
        session
            .handle(text_changed("<root>\n\n<item>x</item>\n\n</root>"))
            .unwrap();

        let outcome = session.handle(save_to("/docs/notes")).unwrap();

        assert_eq!(
            outcome,
            EventOutcome::Saved {
                path: PathBuf::from("/docs/notes.xml")
            }
        );
        assert_eq!(session.document(), "<root>\n    <item>x</item>\n</root>");
        assert_eq!(session.current_path(), Some(Path::new("/docs/notes.xml")));
    }

    #[test]
    fn test_repeat_save_reuses_remembered_path() {
        let mut io = MockDocumentIo::new();
        io.expect_write()
            .withf(|path, _| path.ends_with("doc.xml"))
            .times(2)
            .returning(|_, _| Ok(()));

        let mut session = EditorSession::with_io(io);
        session.handle(text_changed("<a/>")).unwrap();
        session.handle(save_to("/docs/doc.xml")).unwrap();

        session.handle(text_changed("<a><b/></a>")).unwrap();
        let outcome = session
            .handle(EditorEvent::SaveRequested { path: None })
            .unwrap();
        assert_eq!(
            outcome,
            EventOutcome::Saved {
                path: PathBuf::from("/docs/doc.xml")
            }
        );
    }

    #[test]
    fn test_save_without_formatting_keeps_text() {
        let mut io = MockDocumentIo::new();
        io.expect_write()
            .withf(|_, text| text.to_string() == "<a>\n\n<b/></a>")
            .times(1)
            .returning(|_, _| Ok(()));

        let options = SaveOptions {
            format_on_save: false,
            ..SaveOptions::default()
        };
        let mut session = EditorSession::new(io, PrefixCompleter::default(), options);
        session.handle(text_changed("<a>\n\n<b/></a>")).unwrap();
        session.handle(save_to("/docs/a.xml")).unwrap();

        assert_eq!(session.document(), "<a>\n\n<b/></a>");
    }

    #[test]
    fn test_failed_write_leaves_session_untouched() {
        let mut io = MockDocumentIo::new();
        io.expect_write()
            .returning(|_, _| Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")));

        let mut session = EditorSession::with_io(io);
        session.handle(text_changed("<root>\n\n<a/>\n</root>")).unwrap();

        let err = session.handle(save_to("/readonly/doc.xml")).unwrap_err();
        assert!(matches!(err, EditorError::Save { .. }));
        assert_eq!(session.document(), "<root>\n\n<a/>\n</root>");
        assert_eq!(session.current_path(), None);
    }

    #[test]
    fn test_open_replaces_document_and_remembers_path() {
        let mut io = MockDocumentIo::new();
        io.expect_read()
            .withf(|path| path.ends_with("in.xml"))
            .returning(|_| Ok("<doc/>".to_string()));

        let mut session = EditorSession::with_io(io);
        session.handle(text_changed("<old")).unwrap();

        let outcome = session
            .handle(EditorEvent::OpenRequested {
                path: PathBuf::from("/docs/in.xml"),
            })
            .unwrap();

        assert_eq!(
            outcome,
            EventOutcome::Opened {
                path: PathBuf::from("/docs/in.xml")
            }
        );
        assert_eq!(session.document(), "<doc/>");
        assert_eq!(session.caret(), 0);
        assert!(session.completion().is_empty());
        assert_eq!(session.current_path(), Some(Path::new("/docs/in.xml")));
    }

    #[test]
    fn test_failed_open_keeps_document() {
        let mut io = MockDocumentIo::new();
        io.expect_read()
            .returning(|_| Err(io::Error::new(io::ErrorKind::NotFound, "missing")));

        let mut session = EditorSession::with_io(io);
        session.handle(text_changed("<kept/>")).unwrap();

        let err = session
            .handle(EditorEvent::OpenRequested {
                path: PathBuf::from("/docs/missing.xml"),
            })
            .unwrap_err();

        assert!(matches!(err, EditorError::Open { .. }));
        assert_eq!(session.document(), "<kept/>");
        assert_eq!(session.current_path(), None);
    }
}
