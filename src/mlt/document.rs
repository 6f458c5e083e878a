//! MLT XML Document Arena
//!
//! The MLT dialect cross-references elements by string `id` attributes
//! scattered across a flat document. This module models one document as an
//! arena of elements plus an id→index map built once per parse; the reader
//! resolves every "pointer" into owned timeline values, so no graph survives
//! the parse. The writer uses the same arena to assemble its output tree
//! before serializing.

use std::collections::HashMap;
use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{MltError, MltResult};

fn xml_err<E: std::fmt::Display>(e: E) -> MltError {
    MltError::Xml(e.to_string())
}

// =============================================================================
// Element
// =============================================================================

/// One XML element: tag, attributes in document order, text, child indices.
#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<usize>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: vec![],
            text: None,
            children: vec![],
        }
    }
}

// =============================================================================
// Document
// =============================================================================

/// An MLT XML document held as an element arena.
///
/// Elements are addressed by arena index. The id map and all indices are
/// scoped to this document and discarded with it.
#[derive(Debug)]
pub struct Document {
    elements: Vec<Element>,
    root: usize,
    by_id: HashMap<String, usize>,
}

impl Document {
    // -------------------------------------------------------------------------
    // Parsing
    // -------------------------------------------------------------------------

    /// Parses XML text into an arena, indexing every element that carries an
    /// `id` attribute.
    pub fn parse(xml: &str) -> MltResult<Document> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut elements: Vec<Element> = Vec::new();
        let mut by_id: HashMap<String, usize> = HashMap::new();
        let mut stack: Vec<usize> = Vec::new();
        let mut root: Option<usize> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let ix = Self::open_element(&e, &mut elements, &mut by_id, &stack, &mut root)?;
                    stack.push(ix);
                }
                Ok(Event::Empty(e)) => {
                    Self::open_element(&e, &mut elements, &mut by_id, &stack, &mut root)?;
                }
                Ok(Event::Text(t)) => {
                    if let Some(&current) = stack.last() {
                        let text = t.unescape().map_err(xml_err)?;
                        match &mut elements[current].text {
                            Some(existing) => existing.push_str(&text),
                            slot => *slot = Some(text.into_owned()),
                        }
                    }
                }
                Ok(Event::End(_)) => {
                    stack.pop();
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(xml_err(e)),
            }
        }

        let root = root.ok_or_else(|| MltError::Xml("document has no root element".to_string()))?;
        Ok(Document {
            elements,
            root,
            by_id,
        })
    }

    fn open_element(
        start: &BytesStart<'_>,
        elements: &mut Vec<Element>,
        by_id: &mut HashMap<String, usize>,
        stack: &[usize],
        root: &mut Option<usize>,
    ) -> MltResult<usize> {
        let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut element = Element::new(&tag);
        for attr in start.attributes() {
            let attr = attr.map_err(xml_err)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml_err)?.into_owned();
            element.attributes.push((key, value));
        }

        let ix = elements.len();
        if let Some(id) = element
            .attributes
            .iter()
            .find(|(k, _)| k == "id")
            .map(|(_, v)| v.clone())
        {
            by_id.insert(id, ix);
        }
        elements.push(element);

        match stack.last() {
            Some(&parent) => elements[parent].children.push(ix),
            None => {
                if root.is_none() {
                    *root = Some(ix);
                }
            }
        }
        Ok(ix)
    }

    // -------------------------------------------------------------------------
    // Reading
    // -------------------------------------------------------------------------

    /// Index of the document's root element.
    pub fn root(&self) -> usize {
        self.root
    }

    /// Tag name of an element.
    pub fn tag(&self, ix: usize) -> &str {
        &self.elements[ix].tag
    }

    /// Attribute value, if present.
    pub fn attr(&self, ix: usize, name: &str) -> Option<&str> {
        self.elements[ix]
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value, or [`MltError::MissingAttribute`].
    pub fn require_attr(&self, ix: usize, name: &str) -> MltResult<&str> {
        self.attr(ix, name).ok_or_else(|| MltError::MissingAttribute {
            element: self.tag(ix).to_string(),
            attribute: name.to_string(),
        })
    }

    /// Direct children in document order.
    pub fn children(&self, ix: usize) -> impl Iterator<Item = usize> + '_ {
        self.elements[ix].children.iter().copied()
    }

    /// Direct children with a given tag, in document order.
    pub fn children_with_tag<'a>(
        &'a self,
        ix: usize,
        tag: &'a str,
    ) -> impl Iterator<Item = usize> + 'a {
        self.children(ix).filter(move |&c| self.tag(c) == tag)
    }

    /// First direct child with a given tag.
    pub fn find_child(&self, ix: usize, tag: &str) -> Option<usize> {
        self.children_with_tag(ix, tag).next()
    }

    /// Resolves an `id` reference, or [`MltError::UnresolvedReference`].
    pub fn resolve(&self, id: &str) -> MltResult<usize> {
        self.by_id
            .get(id)
            .copied()
            .ok_or_else(|| MltError::UnresolvedReference(id.to_string()))
    }

    /// Value of a `<property name="...">` child, the MLT idiom for typed
    /// metadata. An empty property element yields `Some("")`.
    pub fn property(&self, ix: usize, name: &str) -> Option<&str> {
        self.children_with_tag(ix, "property")
            .find(|&p| self.attr(p, "name") == Some(name))
            .map(|p| self.elements[p].text.as_deref().unwrap_or(""))
    }

    // -------------------------------------------------------------------------
    // Building
    // -------------------------------------------------------------------------

    /// Creates a document containing only a root element.
    pub fn with_root(tag: &str) -> Document {
        Document {
            elements: vec![Element::new(tag)],
            root: 0,
            by_id: HashMap::new(),
        }
    }

    /// Creates a detached element; attach it with [`Document::append`].
    pub fn new_element(&mut self, tag: &str) -> usize {
        let ix = self.elements.len();
        self.elements.push(Element::new(tag));
        ix
    }

    /// Creates an element and attaches it to `parent` immediately.
    pub fn add_child(&mut self, parent: usize, tag: &str) -> usize {
        let ix = self.new_element(tag);
        self.append(parent, ix);
        ix
    }

    /// Attaches a detached element to a parent's child list.
    pub fn append(&mut self, parent: usize, child: usize) {
        self.elements[parent].children.push(child);
    }

    /// Sets (or appends) an attribute.
    pub fn set_attr(&mut self, ix: usize, name: &str, value: &str) {
        self.elements[ix]
            .attributes
            .push((name.to_string(), value.to_string()));
    }

    /// Sets an element's text content.
    pub fn set_text(&mut self, ix: usize, text: &str) {
        self.elements[ix].text = Some(text.to_string());
    }

    /// Adds a `<property name="...">value</property>` child.
    pub fn add_property(&mut self, parent: usize, name: &str, value: &str) {
        let property = self.add_child(parent, "property");
        self.set_attr(property, "name", name);
        self.set_text(property, value);
    }

    // -------------------------------------------------------------------------
    // Serializing
    // -------------------------------------------------------------------------

    /// Serializes the document, prefixed with an XML declaration.
    pub fn to_xml_string(&self) -> MltResult<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(xml_err)?;
        writer
            .write_event(Event::Text(BytesText::new("\n")))
            .map_err(xml_err)?;
        self.write_element(&mut writer, self.root)?;

        let bytes = writer.into_inner().into_inner();
        String::from_utf8(bytes).map_err(xml_err)
    }

    fn write_element(
        &self,
        writer: &mut Writer<Cursor<Vec<u8>>>,
        ix: usize,
    ) -> MltResult<()> {
        let element = &self.elements[ix];
        let mut start = BytesStart::new(element.tag.as_str());
        for (key, value) in &element.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if element.children.is_empty() && element.text.is_none() {
            writer.write_event(Event::Empty(start)).map_err(xml_err)?;
            return Ok(());
        }

        writer.write_event(Event::Start(start)).map_err(xml_err)?;
        if let Some(text) = &element.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(xml_err)?;
        }
        for &child in &element.children {
            self.write_element(writer, child)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(element.tag.as_str())))
            .map_err(xml_err)?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
