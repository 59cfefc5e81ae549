//! Canonical fingerprints for structural comparison.
//!
//! Two mirrored renderers produce the same string for an actual subtree
//! and for the content that would materialize it:
//!
//! ```text
//! -name:attr=value:attr=value:inner_text=text>-child:inner_text=-child2:inner_text=
//! ```
//!
//! Each element contributes `-` and its name, one `:name=value` per
//! attribute, a fixed `:inner_text=` marker followed by its trimmed text,
//! and, when it has children, `>` followed by the children's renderings.
//! Attribute order and sibling order are significant.

use std::fmt;

use crate::content::ContentMap;
use crate::document::Element;

const ELEMENT_MARKER: char = '-';
const INNER_TEXT_MARKER: &str = ":inner_text=";
const CHILDREN_MARKER: char = '>';

/// A canonical rendering of one or more sibling elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short BLAKE3 digest, for reporting drift without dumping the tree.
    pub fn digest(&self) -> String {
        let hash = blake3::hash(self.0.as_bytes());
        hash.to_hex().as_str()[..12].to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render an actual element and its subtree.
pub fn fingerprint_element(element: &Element) -> String {
    let mut out = String::new();
    push_element(&mut out, element);
    out
}

/// Render the children of an element, in document order.
///
/// This is the actual side of a `Replace` comparison.
pub fn fingerprint_children(element: &Element) -> Fingerprint {
    let mut out = String::new();
    for child in element.elements() {
        push_element(&mut out, child);
    }
    Fingerprint(out)
}

/// Render declared content, in declaration order.
///
/// This is the expected side of a `Replace` comparison.
pub fn fingerprint_content(content: &ContentMap) -> Fingerprint {
    let mut out = String::new();
    push_content(&mut out, content);
    Fingerprint(out)
}

fn push_element(out: &mut String, element: &Element) {
    out.push(ELEMENT_MARKER);
    out.push_str(&element.name);
    for attr in &element.attributes {
        push_attribute(out, &attr.name, &attr.value);
    }
    out.push_str(INNER_TEXT_MARKER);
    out.push_str(element.text().trim());

    if element.has_elements() {
        out.push(CHILDREN_MARKER);
        for child in element.elements() {
            push_element(out, child);
        }
    }
}

fn push_content(out: &mut String, content: &ContentMap) {
    for (_, entry) in content.entries() {
        out.push(ELEMENT_MARKER);
        out.push_str(&entry.element_name);
        for (name, value) in &entry.attributes {
            push_attribute(out, name, value);
        }
        out.push_str(INNER_TEXT_MARKER);
        out.push_str(entry.inner_text.as_deref().unwrap_or("").trim());

        // An empty nested mapping materializes no children, so it must
        // render like an element without children.
        if let Some(nested) = entry.content.as_ref().filter(|c| !c.is_empty()) {
            out.push(CHILDREN_MARKER);
            push_content(out, nested);
        }
    }
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(':');
    out.push_str(name);
    out.push('=');
    out.push_str(value);
}
