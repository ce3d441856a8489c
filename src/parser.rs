//! Well-formedness checking XML parser
//!
//! Tokenizing is done by `quick-xml`; this module adds the document-level
//! rules the tokenizer leaves to its callers (single root element, no
//! character data outside the root, name syntax, entity references) and
//! builds an owned tree for the pretty-printer.
//!
//! Document type declarations are kept verbatim. The only thing read from
//! them is the internal subset's general entity declarations: entities with
//! a literal value are expanded, while `SYSTEM`/`PUBLIC` entities are never
//! loaded and referencing one is an error.

use std::borrow::Cow;
use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::escape::unescape_with;
use quick_xml::events::{BytesStart, Event};

use crate::error::ParseError;

/// A parsed, well-formed XML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    /// Declaration, doctype, comments and PIs before the root element
    pub prolog: Vec<Node>,
    pub root: Element,
    /// Comments and PIs after the root element
    pub epilog: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Character data with references already expanded
    Text(String),
    /// Raw `<![CDATA[...]]>` section
    CData(String),
    /// Raw `<!--...-->` comment
    Comment(String),
    /// Raw `<?target ...?>` instruction
    ProcessingInstruction(String),
    /// Raw `<?xml ...?>` declaration
    Declaration(String),
    /// Raw `<!DOCTYPE ...>` declaration
    DocType(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// Attribute values are unescaped; source order is preserved
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// Parse `text` as a single well-formed XML document.
pub fn parse_document(text: &str) -> Result<XmlDocument, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    if let Some((offset, c)) = text.char_indices().find(|&(_, c)| !is_xml_char(c)) {
        return Err(ParseError::at(
            format!("invalid character U+{:04X}", c as u32),
            text,
            offset,
        ));
    }

    let mut reader = Reader::from_str(text);
    let config = reader.config_mut();
    config.trim_text(false);
    config.expand_empty_elements = false;
    config.check_end_names = true;
    config.check_comments = true;

    let mut builder = TreeBuilder::default();

    loop {
        let start = reader.buffer_position() as usize;
        // Errors are reported at the start of the markup being read
        let event = reader
            .read_event()
            .map_err(|err| ParseError::at(err.to_string(), text, start))?;
        let end = (reader.buffer_position() as usize).min(text.len());
        let raw = &text[start.min(end)..end];

        match event {
            Event::Start(e) => {
                let element = read_element(&e, &builder.entities, text, start)?;
                builder.open(element, text, start)?;
            }
            Event::Empty(e) => {
                let element = read_element(&e, &builder.entities, text, start)?;
                builder.push_element(element, text, start)?;
            }
            Event::End(_) => builder.close(text, start)?,
            Event::Text(_) => builder.text(raw, text, start)?,
            Event::CData(_) => builder.content(Node::CData(raw.to_string()), "CDATA section", text, start)?,
            Event::Comment(_) => builder.misc(Node::Comment(raw.to_string())),
            Event::PI(_) => builder.misc(Node::ProcessingInstruction(raw.to_string())),
            Event::Decl(_) => {
                if start != 0 {
                    return Err(ParseError::at(
                        "XML declaration is only allowed at the start of the document",
                        text,
                        start,
                    ));
                }
                builder.prolog.push(Node::Declaration(raw.to_string()));
            }
            Event::DocType(_) => builder.doctype(raw, text, start)?,
            Event::Eof => return builder.finish(text),
        }
    }
}

fn read_element(
    start: &BytesStart<'_>,
    entities: &Entities,
    text: &str,
    offset: usize,
) -> Result<Element, ParseError> {
    let qname = start.name();
    let name = decode(qname.as_ref(), text, offset)?;
    if !is_xml_name(name) {
        return Err(ParseError::at(
            format!("invalid element name `{}`", name),
            text,
            offset,
        ));
    }

    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| {
            ParseError::at(
                format!("malformed attribute in element `{}`: {}", name, err),
                text,
                offset,
            )
        })?;

        let key = decode(attribute.key.as_ref(), text, offset)?;
        if !is_xml_name(key) {
            return Err(ParseError::at(
                format!("invalid attribute name `{}` in element `{}`", key, name),
                text,
                offset,
            ));
        }

        let raw_value = decode(attribute.value.as_ref(), text, offset)?;
        if raw_value.contains('<') {
            return Err(ParseError::at(
                format!("`<` is not allowed in the value of attribute `{}`", key),
                text,
                offset,
            ));
        }
        let value = entities.expand(raw_value).map_err(|message| {
            ParseError::at(
                format!("invalid reference in attribute `{}`: {}", key, message),
                text,
                offset,
            )
        })?;
        attributes.push((key.to_string(), value.into_owned()));
    }

    Ok(Element {
        name: name.to_string(),
        attributes,
        children: Vec::new(),
    })
}

fn decode<'a>(bytes: &'a [u8], text: &str, offset: usize) -> Result<&'a str, ParseError> {
    std::str::from_utf8(bytes)
        .map_err(|err| ParseError::at(format!("invalid UTF-8: {}", err), text, offset))
}

/// Check the XML `Name` production, approximated for non-ASCII characters
pub fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    let is_start = |c: char| c.is_alphabetic() || c == '_' || c == ':';
    is_start(first) && chars.all(|c| is_start(c) || c.is_alphanumeric() || matches!(c, '-' | '.'))
}

fn is_xml_whitespace(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}

/// The XML `Char` production; surrogates cannot occur in a `char`
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

fn predefined_entity(name: &str) -> Option<&'static str> {
    match name {
        "lt" => Some("<"),
        "gt" => Some(">"),
        "amp" => Some("&"),
        "apos" => Some("'"),
        "quot" => Some("\""),
        _ => None,
    }
}

/// Replacement text of a single entity is capped so nested declarations
/// cannot blow up memory.
const MAX_ENTITY_LENGTH: usize = 1 << 16;

#[derive(Debug, Clone, PartialEq, Eq)]
enum EntityValue {
    Internal(String),
    /// Declared with `SYSTEM` or `PUBLIC`; never loaded
    External,
}

/// General entities declared in the internal DTD subset
#[derive(Debug, Default)]
struct Entities {
    declared: HashMap<String, EntityValue>,
}

impl Entities {
    /// Read the `<!ENTITY ...>` declarations of a raw `<!DOCTYPE ...>`.
    ///
    /// Parameter entities are skipped. The first declaration of a name wins.
    fn from_doctype(doctype: &str) -> Result<Self, String> {
        let mut entities = Entities::default();

        for (index, _) in doctype.match_indices("<!ENTITY") {
            let rest = doctype[index + "<!ENTITY".len()..].trim_start();
            if rest.starts_with('%') {
                continue;
            }

            let name_end = rest
                .find(|c: char| c.is_whitespace())
                .ok_or_else(|| "malformed entity declaration".to_string())?;
            let name = &rest[..name_end];
            if !is_xml_name(name) {
                return Err(format!("invalid entity name `{}`", name));
            }

            let definition = rest[name_end..].trim_start();
            let value = match definition.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = &definition[1..];
                    let end = body
                        .find(quote)
                        .ok_or_else(|| format!("unterminated value for entity `{}`", name))?;
                    let expanded = entities
                        .expand(&body[..end])
                        .map_err(|message| format!("in entity `{}`: {}", name, message))?;
                    if expanded.contains('<') {
                        return Err(format!("entity `{}` contains markup, which is not supported", name));
                    }
                    if expanded.len() > MAX_ENTITY_LENGTH {
                        return Err(format!(
                            "entity `{}` expands beyond {} bytes",
                            name, MAX_ENTITY_LENGTH
                        ));
                    }
                    EntityValue::Internal(expanded.into_owned())
                }
                _ if definition.starts_with("SYSTEM") || definition.starts_with("PUBLIC") => {
                    EntityValue::External
                }
                _ => return Err(format!("malformed declaration of entity `{}`", name)),
            };

            entities.declared.entry(name.to_string()).or_insert(value);
        }

        Ok(entities)
    }

    /// Expand predefined, declared and character references in `raw`
    fn expand<'a>(&self, raw: &'a str) -> Result<Cow<'a, str>, String> {
        if let Some(name) = self.external_reference(raw) {
            return Err(format!("external entity `{}` is never loaded", name));
        }

        let expanded = unescape_with(raw, |name| {
            predefined_entity(name).or_else(|| match self.declared.get(name) {
                Some(EntityValue::Internal(value)) => Some(value.as_str()),
                _ => None,
            })
        })
        .map_err(|err| err.to_string())?;

        if let Some(c) = expanded.chars().find(|&c| !is_xml_char(c)) {
            return Err(format!("reference to invalid character U+{:04X}", c as u32));
        }
        Ok(expanded)
    }

    fn external_reference(&self, raw: &str) -> Option<&str> {
        self.declared.iter().find_map(|(name, value)| {
            (*value == EntityValue::External && raw.contains(&format!("&{};", name)))
                .then_some(name.as_str())
        })
    }
}

#[derive(Default)]
struct TreeBuilder {
    entities: Entities,
    prolog: Vec<Node>,
    root: Option<Element>,
    epilog: Vec<Node>,
    open: Vec<Element>,
}

impl TreeBuilder {
    fn check_single_root(&self, text: &str, offset: usize) -> Result<(), ParseError> {
        if self.open.is_empty() && self.root.is_some() {
            return Err(ParseError::at(
                "document has more than one root element",
                text,
                offset,
            ));
        }
        Ok(())
    }

    fn open(&mut self, element: Element, text: &str, offset: usize) -> Result<(), ParseError> {
        self.check_single_root(text, offset)?;
        self.open.push(element);
        Ok(())
    }

    fn push_element(&mut self, element: Element, text: &str, offset: usize) -> Result<(), ParseError> {
        self.check_single_root(text, offset)?;
        self.attach(element);
        Ok(())
    }

    fn close(&mut self, text: &str, offset: usize) -> Result<(), ParseError> {
        match self.open.pop() {
            Some(element) => {
                self.attach(element);
                Ok(())
            }
            None => Err(ParseError::at("unexpected end tag", text, offset)),
        }
    }

    fn attach(&mut self, element: Element) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(Node::Element(element)),
            None => self.root = Some(element),
        }
    }

    fn text(&mut self, raw: &str, text: &str, offset: usize) -> Result<(), ParseError> {
        let Some(parent) = self.open.last_mut() else {
            if is_xml_whitespace(raw) {
                return Ok(());
            }
            return Err(ParseError::at(
                "text is not allowed outside the root element",
                text,
                offset,
            ));
        };

        if let Some(index) = raw.find("]]>") {
            return Err(ParseError::at(
                "`]]>` is not allowed in character data",
                text,
                offset + index,
            ));
        }

        let value = self.entities.expand(raw).map_err(|message| {
            ParseError::at(
                format!("invalid character or entity reference: {}", message),
                text,
                offset,
            )
        })?;
        parent.children.push(Node::Text(value.into_owned()));
        Ok(())
    }

    fn content(&mut self, node: Node, what: &str, text: &str, offset: usize) -> Result<(), ParseError> {
        match self.open.last_mut() {
            Some(parent) => {
                parent.children.push(node);
                Ok(())
            }
            None => Err(ParseError::at(
                format!("{} is not allowed outside the root element", what),
                text,
                offset,
            )),
        }
    }

    fn misc(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None if self.root.is_some() => self.epilog.push(node),
            None => self.prolog.push(node),
        }
    }

    fn doctype(&mut self, raw: &str, text: &str, offset: usize) -> Result<(), ParseError> {
        let misplaced = !self.open.is_empty()
            || self.root.is_some()
            || self.prolog.iter().any(|node| matches!(node, Node::DocType(_)));
        if misplaced {
            return Err(ParseError::at(
                "document type declaration must appear once, before the root element",
                text,
                offset,
            ));
        }
        self.entities =
            Entities::from_doctype(raw).map_err(|message| ParseError::at(message, text, offset))?;
        self.prolog.push(Node::DocType(raw.to_string()));
        Ok(())
    }

    fn finish(self, text: &str) -> Result<XmlDocument, ParseError> {
        if let Some(unclosed) = self.open.last() {
            return Err(ParseError::at(
                format!(
                    "unexpected end of document: element `{}` is not closed",
                    unclosed.name
                ),
                text,
                text.len(),
            ));
        }

        let root = self
            .root
            .ok_or_else(|| ParseError::at("document has no root element", text, text.len()))?;

        Ok(XmlDocument {
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }
}
