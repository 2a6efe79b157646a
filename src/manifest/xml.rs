// src/manifest/xml.rs

//! Minimal owned XML element tree
//!
//! Manifests are read with quick-xml into a small tree that can be mutated
//! and written back out. Only what add-on manifests need is kept: elements,
//! attributes in document order, text, CDATA and comments. Whitespace-only
//! text between elements is dropped on parse so re-indentation is clean.

use crate::error::{Error, Result};
use quick_xml::escape::escape;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use std::io::Write;

/// A child of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

/// An XML element with its attributes and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Element holding a single text node
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.children.push(Node::Text(text.into()));
        element
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place
    #[cfg(test)]
    pub(crate) fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Append an element as the last child
    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Direct child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First direct child element with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// Concatenated direct text and CDATA content
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) | Node::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Index into `children` of the first element named `name` whose
    /// attribute `key` equals `value`
    pub fn position_of_child(&self, name: &str, key: &str, value: &str) -> Option<usize> {
        self.children.iter().position(|node| match node {
            Node::Element(e) => e.name == name && e.attribute(key) == Some(value),
            _ => false,
        })
    }

    /// Mutable access to the element at a `children` index
    pub fn child_at_mut(&mut self, index: usize) -> Option<&mut Element> {
        match self.children.get_mut(index) {
            Some(Node::Element(e)) => Some(e),
            _ => None,
        }
    }

    /// Parse a document and return its root element
    pub fn parse(xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                Error::ParseError(format!(
                    "Invalid XML at position {}: {e}",
                    reader.buffer_position()
                ))
            })?;

            match event {
                Event::Start(start) => stack.push(element_from_start(&start)?),
                Event::Empty(start) => {
                    let element = element_from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::ParseError("Unbalanced closing tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = text
                            .unescape()
                            .map_err(|e| Error::ParseError(format!("Invalid text content: {e}")))?;
                        if !text.trim().is_empty() {
                            parent.children.push(Node::Text(text.into_owned()));
                        }
                    }
                }
                Event::CData(cdata) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::CData(utf8(cdata.into_inner().into_owned())?));
                    }
                }
                Event::Comment(comment) => {
                    // Comments outside the root element are not kept
                    if let Some(parent) = stack.last_mut() {
                        let text = utf8(comment.into_inner().into_owned())?;
                        parent.children.push(Node::Comment(text));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::ParseError(format!("Unclosed element <{}>", open.name)));
        }

        root.ok_or_else(|| Error::ParseError("Document has no root element".to_string()))
    }

    /// Serialize as a standalone UTF-8 document with an XML declaration
    ///
    /// Pretty output uses two-space indentation and ends with a newline.
    pub fn to_document(&self, pretty: bool) -> Result<Vec<u8>> {
        let mut writer = if pretty {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };

        emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        if !pretty {
            writer.get_mut().push(b'\n');
        }

        write_element(&mut writer, self)?;

        let mut bytes = writer.into_inner();
        if pretty {
            bytes.push(b'\n');
        }
        Ok(bytes)
    }
}

fn utf8(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| Error::ParseError(format!("Invalid UTF-8 in XML: {e}")))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element::new(utf8(start.name().as_ref().to_vec())?);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::ParseError(format!("Invalid attribute: {e}")))?;
        let key = utf8(attr.key.as_ref().to_vec())?;
        let value = attr
            .unescape_value()
            .map_err(|e| Error::ParseError(format!("Invalid attribute value for {key}: {e}")))?;
        element.attributes.push((key, value.into_owned()));
    }

    Ok(element)
}

/// Hang a finished element on its parent, or make it the document root
fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(Error::ParseError(format!(
                "Second root element <{}>",
                element.name
            )));
        }
    }
    Ok(())
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::IoError(format!("Failed to write XML: {e}")))
}

/// Escape an attribute value, keeping whitespace that normalization would fold
fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in escape(value).chars() {
        match c {
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        let value = escape_attribute(value);
        // already escaped, pushed as raw bytes
        start.push_attribute((key.as_bytes(), value.as_bytes()));
    }

    if element.children.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(e) => write_element(writer, e)?,
            Node::Text(t) => emit(writer, Event::Text(BytesText::new(t)))?,
            Node::CData(t) => emit(writer, Event::CData(BytesCData::new(t.as_str())))?,
            Node::Comment(t) => {
                emit(writer, Event::Comment(BytesText::from_escaped(t.as_str())))?
            }
        }
    }
    emit(writer, Event::End(BytesEnd::new(element.name.as_str())))
}
