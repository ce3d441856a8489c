//! Pretty-printer for well-formed XML
//!
//! Serialization follows the classic DOM `toprettyxml` layout: every node
//! goes on its own line, text nodes are written untrimmed at the current
//! indent, and elements whose only child is text stay on one line. The
//! layout leaves whitespace-only lines behind wherever the source had
//! formatting whitespace; those lines are dropped in a final pass, so the
//! output never contains a blank line. Whitespace-only lines inside mixed
//! content are dropped as well.

use std::fmt::Write;

use quick_xml::escape::partial_escape;

use crate::error::ParseError;
use crate::parser::{Element, Node, XmlDocument, parse_document};

/// Indent used for each nesting level when none is configured
pub const DEFAULT_INDENT: &str = "    ";

/// Reformat `text` with one `indent` per nesting level.
///
/// The input must be well-formed; otherwise the parse error is returned.
/// Lines are separated by `\n` and the result has no trailing newline.
pub fn prettify(text: &str, indent: &str) -> Result<String, ParseError> {
    let document = parse_document(text)?;
    Ok(drop_blank_lines(&serialize(&document, indent)))
}

/// Remove every empty or whitespace-only line and join the rest with `\n`.
pub fn drop_blank_lines(text: &str) -> String {
    text.split(|c: char| c == '\n' || c == '\r')
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize a parsed document without the blank-line pass
pub fn serialize(document: &XmlDocument, indent: &str) -> String {
    let mut out = String::new();
    for node in &document.prolog {
        write_node(&mut out, node, "", indent);
    }
    write_element(&mut out, &document.root, "", indent);
    for node in &document.epilog {
        write_node(&mut out, node, "", indent);
    }
    out
}

fn write_node(out: &mut String, node: &Node, current: &str, indent: &str) {
    match node {
        Node::Element(element) => write_element(out, element, current, indent),
        Node::Text(text) => {
            out.push_str(current);
            out.push_str(&escape_text(text));
            out.push('\n');
        }
        Node::CData(raw)
        | Node::Comment(raw)
        | Node::ProcessingInstruction(raw)
        | Node::Declaration(raw)
        | Node::DocType(raw) => {
            out.push_str(current);
            out.push_str(raw);
            out.push('\n');
        }
    }
}

fn write_element(out: &mut String, element: &Element, current: &str, indent: &str) {
    out.push_str(current);
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        // Writing into a String cannot fail
        let _ = write!(out, " {}=\"{}\"", key, escape_attribute(value));
    }

    match element.children.as_slice() {
        [] => out.push_str("/>\n"),
        [Node::Text(text)] => {
            out.push('>');
            out.push_str(&escape_text(text));
            write_end_tag(out, &element.name);
        }
        [Node::CData(raw)] => {
            out.push('>');
            out.push_str(raw);
            write_end_tag(out, &element.name);
        }
        children => {
            out.push_str(">\n");
            let child_indent = format!("{}{}", current, indent);
            for child in children {
                write_node(out, child, &child_indent, indent);
            }
            out.push_str(current);
            write_end_tag(out, &element.name);
        }
    }
}

fn write_end_tag(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push_str(">\n");
}

/// A literal `\r` would be normalized away on the next read
fn escape_text(text: &str) -> String {
    partial_escape(text).replace('\r', "&#13;")
}

/// Whitespace other than spaces is written as a character reference so
/// attribute-value normalization keeps it on the next read.
fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
