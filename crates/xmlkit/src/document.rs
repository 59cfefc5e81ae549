//! In-memory XML document: loading from bytes and writing back.
//!
//! The tree is owned top-down. Elements hold their children by value, so
//! every mutation is a splice on a `Vec<Node>` and there are no parent
//! pointers to keep consistent. Elements are addressed from the outside
//! through [`ElementPath`], the chain of child indices leading to them.

use std::fmt;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};

use crate::error::{Error, Result};

/// Default pretty-print width used when formatting is not suppressed.
pub const DEFAULT_INDENT: usize = 4;

/// How a document is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Drop whitespace-only text and re-indent with this many spaces
    Indent(usize),
    /// Write every node as it was loaded
    Preserve,
}

impl Format {
    /// Map the boolean-like `preventformat` flag onto a format.
    pub fn from_prevent_format(prevent: bool) -> Self {
        if prevent {
            Self::Preserve
        } else {
            Self::default()
        }
    }
}

impl Default for Format {
    fn default() -> Self {
        Self::Indent(DEFAULT_INDENT)
    }
}

/// A single attribute, kept in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// The `<?xml ...?>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

/// Any node that can appear in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Unescaped character data
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
    Declaration(Declaration),
}

/// An element with its attributes and owned children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Look up an attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Overwrite an attribute in place, or append it if absent.
    ///
    /// Returns `true` if the element changed.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> bool {
        if let Some(existing) = self.attributes.iter_mut().find(|a| a.name == name) {
            if existing.value == value {
                return false;
            }
            existing.value = value.to_string();
        } else {
            self.attributes.push(Attribute {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
        true
    }

    /// The first direct text or CDATA child, or `""` when there is none.
    ///
    /// Text after a child element is not part of it: `<b>t<c/>u</b>`
    /// yields `t`.
    pub fn text(&self) -> &str {
        self.children
            .iter()
            .find_map(|child| match child {
                Node::Text(t) | Node::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .unwrap_or("")
    }

    /// Replace direct text children with a single text node placed first.
    pub fn set_text(&mut self, text: &str) {
        self.children
            .retain(|c| !matches!(c, Node::Text(_) | Node::CData(_)));
        self.children.insert(0, Node::Text(text.to_string()));
    }

    /// Iterate over element children in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Whether any child is an element.
    pub fn has_elements(&self) -> bool {
        self.elements().next().is_some()
    }

    /// Drop every child node.
    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Append a child element and return a handle to it.
    pub fn append_element(&mut self, element: Element) -> &mut Element {
        self.children.push(Node::Element(element));
        match self.children.last_mut() {
            Some(Node::Element(e)) => e,
            _ => unreachable!("an element was just pushed"),
        }
    }

    fn child_element(&self, index: usize) -> Option<&Element> {
        match self.children.get(index)? {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    fn child_element_mut(&mut self, index: usize) -> Option<&mut Element> {
        match self.children.get_mut(index)? {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }
}

/// Handle to an element: child indices from the root element.
///
/// Indices point into `Element::children`, so comparing paths
/// lexicographically yields document order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ElementPath(Vec<usize>);

impl ElementPath {
    /// The root element.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of the child at `index` under this element.
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Split into parent path and index within the parent.
    pub fn split_last(&self) -> Option<(Self, usize)> {
        let (last, parent) = self.0.split_last()?;
        Some((Self(parent.to_vec()), *last))
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/")?;
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("/"))
    }
}

/// A loaded XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Declaration, comments, PIs, DOCTYPE and the whitespace between them,
    /// before the root element
    pub prolog: Vec<Node>,
    pub root: Element,
    /// Comments, PIs and whitespace after the root element
    pub epilog: Vec<Node>,
}

impl Document {
    /// Parse a document from raw bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let source = std::str::from_utf8(bytes)
            .map_err(|e| Error::malformed(format!("document is not valid UTF-8: {e}")))?;
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);

        let mut reader = Reader::from_str(source);
        let mut builder = TreeBuilder::default();

        loop {
            let event = reader
                .read_event()
                .map_err(|e| Error::malformed(format!("at byte {}: {e}", reader.buffer_position())))?;

            match event {
                Event::Start(start) => builder.open(element_from_start(&start)?),
                Event::Empty(start) => builder.attach(Node::Element(element_from_start(&start)?))?,
                Event::End(_) => builder.close()?,
                Event::Text(text) => {
                    let value = text
                        .unescape()
                        .map_err(|e| Error::malformed(e.to_string()))?
                        .into_owned();
                    builder.attach(Node::Text(value))?;
                }
                Event::CData(data) => builder.attach(Node::CData(owned_utf8(&data)?))?,
                Event::Comment(comment) => builder.attach(Node::Comment(owned_utf8(&comment)?))?,
                Event::PI(pi) => builder.attach(Node::ProcessingInstruction(owned_utf8(&pi)?))?,
                Event::DocType(doctype) => builder.attach(Node::DocType(owned_utf8(&doctype)?))?,
                Event::Decl(decl) => builder.attach(Node::Declaration(declaration(&decl)?))?,
                Event::Eof => break,
            }
        }

        builder.finish()
    }

    /// Serialize the document.
    pub fn to_bytes(&self, format: Format) -> Result<Vec<u8>> {
        let pretty = matches!(format, Format::Indent(_));
        let mut writer = match format {
            Format::Indent(width) => Writer::new_with_indent(Vec::new(), b' ', width),
            Format::Preserve => Writer::new(Vec::new()),
        };

        // The indenting writer breaks lines itself and skips whitespace
        // text; the plain one writes the loaded whitespace back verbatim.
        for node in &self.prolog {
            write_node(&mut writer, node, pretty)?;
        }
        write_element(&mut writer, &self.root, pretty)?;
        for node in &self.epilog {
            write_node(&mut writer, node, pretty)?;
        }

        let mut bytes = writer.into_inner();
        if pretty {
            bytes.push(b'\n');
        }
        Ok(bytes)
    }

    /// Resolve a handle to an element.
    pub fn element(&self, path: &ElementPath) -> Option<&Element> {
        let mut current = &self.root;
        for &index in path.indices() {
            current = current.child_element(index)?;
        }
        Some(current)
    }

    /// Resolve a handle to a mutable element.
    pub fn element_mut(&mut self, path: &ElementPath) -> Option<&mut Element> {
        let mut current = &mut self.root;
        for &index in path.indices() {
            current = current.child_element_mut(index)?;
        }
        Some(current)
    }

    /// Detach the element at `path` (and its subtree) from its parent.
    ///
    /// The root element cannot be detached; `None` is returned for it and
    /// for stale handles.
    pub fn remove(&mut self, path: &ElementPath) -> Option<Element> {
        let (parent_path, index) = path.split_last()?;
        let parent = self.element_mut(&parent_path)?;
        if !matches!(parent.children.get(index), Some(Node::Element(_))) {
            return None;
        }
        match parent.children.remove(index) {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }
}

/// Stack-based assembly of the tree from reader events.
#[derive(Default)]
struct TreeBuilder {
    open: Vec<Element>,
    prolog: Vec<Node>,
    root: Option<Element>,
    epilog: Vec<Node>,
}

impl TreeBuilder {
    fn open(&mut self, element: Element) {
        self.open.push(element);
    }

    fn close(&mut self) -> Result<()> {
        let element = self
            .open
            .pop()
            .ok_or_else(|| Error::malformed("closing tag without a matching start tag"))?;
        self.attach(Node::Element(element))
    }

    fn attach(&mut self, node: Node) -> Result<()> {
        if let Some(parent) = self.open.last_mut() {
            parent.children.push(node);
            return Ok(());
        }

        match node {
            Node::Element(element) => {
                if let Some(existing) = &self.root {
                    return Err(Error::malformed(format!(
                        "second root element <{}> after <{}>",
                        element.name, existing.name
                    )));
                }
                self.root = Some(element);
            }
            Node::Text(text) if !text.trim().is_empty() => {
                return Err(Error::malformed(format!(
                    "text outside the root element: '{}'",
                    text.trim()
                )));
            }
            Node::CData(_) => {
                return Err(Error::malformed("CDATA section outside the root element"));
            }
            misc => {
                if self.root.is_some() {
                    self.epilog.push(misc);
                } else {
                    self.prolog.push(misc);
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Document> {
        if let Some(unclosed) = self.open.last() {
            return Err(Error::malformed(format!(
                "unexpected end of document, <{}> is not closed",
                unclosed.name
            )));
        }
        let root = self
            .root
            .ok_or_else(|| Error::malformed("document has no root element"))?;
        Ok(Document {
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }
}

fn owned_utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| Error::malformed(e.to_string()))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element::new(owned_utf8(start.name().as_ref())?);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::malformed(format!("in <{}>: {e}", element.name)))?;
        let name = owned_utf8(attr.key.as_ref())?;
        let value = attr
            .unescape_value()
            .map_err(|e| Error::malformed(format!("attribute '{name}': {e}")))?
            .into_owned();
        element.attributes.push(Attribute { name, value });
    }
    Ok(element)
}

fn declaration(decl: &BytesDecl<'_>) -> Result<Declaration> {
    let version = owned_utf8(&decl.version().map_err(declaration_error)?)?;
    let encoding = match decl.encoding() {
        Some(value) => Some(owned_utf8(&value.map_err(declaration_error)?)?),
        None => None,
    };
    let standalone = match decl.standalone() {
        Some(value) => Some(owned_utf8(&value.map_err(declaration_error)?)?),
        None => None,
    };
    Ok(Declaration {
        version,
        encoding,
        standalone,
    })
}

fn declaration_error(e: impl std::fmt::Display) -> Error {
    Error::malformed(format!("XML declaration: {e}"))
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node, pretty: bool) -> Result<()> {
    match node {
        Node::Element(element) => write_element(writer, element, pretty),
        Node::Text(text) => {
            if pretty && text.trim().is_empty() {
                return Ok(());
            }
            emit(writer, Event::Text(BytesText::from_escaped(partial_escape(text.as_str()))))
        }
        Node::CData(data) => emit(writer, Event::CData(BytesCData::new(data.as_str()))),
        Node::Comment(comment) => emit(
            writer,
            Event::Comment(BytesText::from_escaped(comment.as_str())),
        ),
        Node::ProcessingInstruction(pi) => emit(writer, Event::PI(BytesPI::new(pi.as_str()))),
        Node::DocType(doctype) => emit(
            writer,
            Event::DocType(BytesText::from_escaped(doctype.as_str())),
        ),
        Node::Declaration(decl) => emit(
            writer,
            Event::Decl(BytesDecl::new(
                &decl.version,
                decl.encoding.as_deref(),
                decl.standalone.as_deref(),
            )),
        ),
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element, pretty: bool) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for attr in &element.attributes {
        start.push_attribute((attr.name.as_str(), attr.value.as_str()));
    }

    let has_content = element
        .children
        .iter()
        .any(|c| !(pretty && matches!(c, Node::Text(t) if t.trim().is_empty())));

    if !has_content {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child, pretty)?;
    }
    emit(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Serialize(e.to_string()))
}
