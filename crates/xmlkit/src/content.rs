//! Declared content: the desired attributes or child-element trees.
//!
//! Content arrives as a loosely typed, ordered mapping ([`ContentValue`])
//! and is validated once into [`ContentMap`] / [`AttributeMap`]. After
//! that, the hasher and the builder only ever see typed descriptors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Key naming the element to create for a content entry.
pub const ELEMENT_NAME: &str = "element_name";
/// Key holding an entry's inner text.
pub const INNER_TEXT: &str = "inner_text";
/// Key holding an entry's nested content mapping.
pub const CONTENT: &str = "content";

/// Keys that are never materialized as attributes.
///
/// Shared by the parser below, the fingerprint and the builder.
pub const RESERVED_KEYS: [&str; 3] = [ELEMENT_NAME, INNER_TEXT, CONTENT];

/// Check whether a content key is reserved.
pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Whether `name` is an XML `Name` and can be written as an element or
/// attribute name.
pub fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_name_start_char) && chars.all(is_name_char)
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}' | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

fn check_name(what: &str, name: &str) -> Result<()> {
    if is_xml_name(name) {
        Ok(())
    } else {
        Err(Error::invalid_content(format!(
            "{what} '{name}' is not a valid XML name"
        )))
    }
}

/// Raw content as declared in a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<ContentValue>),
    Table(IndexMap<String, ContentValue>),
}

impl ContentValue {
    /// String coercion for scalar values; `None` for arrays and tables.
    pub fn as_scalar(&self) -> Option<String> {
        match self {
            Self::Boolean(b) => Some(b.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::Array(_) | Self::Table(_) => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Table(_) => "table",
        }
    }

    fn as_table(&self, what: &str) -> Result<&IndexMap<String, ContentValue>> {
        match self {
            Self::Table(table) => Ok(table),
            other => Err(Error::invalid_content(format!(
                "{what} must be a table, found {}",
                other.kind()
            ))),
        }
    }

    fn scalar(&self, what: &str) -> Result<String> {
        self.as_scalar().ok_or_else(|| {
            Error::invalid_content(format!("{what} must be a scalar, found {}", self.kind()))
        })
    }
}

/// Attributes to overwrite on every matched element, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeMap(IndexMap<String, String>);

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a raw `SetAttributes` payload.
    pub fn from_value(value: &ContentValue) -> Result<Self> {
        let table = value.as_table("SetAttributes content")?;
        let mut attributes = IndexMap::with_capacity(table.len());
        for (name, value) in table {
            check_name("attribute", name)?;
            attributes.insert(name.clone(), value.scalar(&format!("attribute '{name}'"))?);
        }
        Ok(Self(attributes))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One declared child element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDescriptor {
    pub element_name: String,
    pub inner_text: Option<String>,
    /// Every non-reserved key, string-coerced, in declaration order
    pub attributes: IndexMap<String, String>,
    pub content: Option<ContentMap>,
}

impl EntryDescriptor {
    pub fn new(element_name: impl Into<String>) -> Self {
        Self {
            element_name: element_name.into(),
            inner_text: None,
            attributes: IndexMap::new(),
            content: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.inner_text = Some(text.into());
        self
    }

    pub fn with_content(mut self, content: ContentMap) -> Self {
        self.content = Some(content);
        self
    }

    fn from_value(path: &str, value: &ContentValue) -> Result<Self> {
        let table = value.as_table(&format!("content entry '{path}'"))?;

        let element_name = match table.get(ELEMENT_NAME) {
            Some(name) => name.scalar(&format!("'{path}.{ELEMENT_NAME}'"))?,
            None => {
                return Err(Error::invalid_content(format!(
                    "content entry '{path}' is missing required key '{ELEMENT_NAME}'"
                )));
            }
        };
        check_name(&format!("'{path}.{ELEMENT_NAME}'"), &element_name)?;

        let mut entry = Self::new(element_name);
        for (key, value) in table {
            match key.as_str() {
                ELEMENT_NAME => {}
                INNER_TEXT => {
                    entry.inner_text = Some(value.scalar(&format!("'{path}.{INNER_TEXT}'"))?);
                }
                CONTENT => {
                    entry.content = Some(ContentMap::from_table(
                        value.as_table(&format!("'{path}.{CONTENT}'"))?,
                        Some(&format!("{path}.{CONTENT}")),
                    )?);
                }
                attribute => {
                    check_name(&format!("attribute in '{path}'"), attribute)?;
                    let value = value.scalar(&format!("attribute '{path}.{attribute}'"))?;
                    entry.attributes.insert(attribute.to_string(), value);
                }
            }
        }
        Ok(entry)
    }
}

/// Ordered mapping of entry keys to declared child elements.
///
/// Entry keys only identify entries in the manifest; they are never
/// written to the document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentMap(IndexMap<String, EntryDescriptor>);

impl ContentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a raw `Replace` payload.
    pub fn from_value(value: &ContentValue) -> Result<Self> {
        Self::from_table(value.as_table("Replace content")?, None)
    }

    fn from_table(table: &IndexMap<String, ContentValue>, prefix: Option<&str>) -> Result<Self> {
        let mut entries = IndexMap::with_capacity(table.len());
        for (key, value) in table {
            let path = match prefix {
                Some(prefix) => format!("{prefix}.{key}"),
                None => key.clone(),
            };
            entries.insert(key.clone(), EntryDescriptor::from_value(&path, value)?);
        }
        Ok(Self(entries))
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: EntryDescriptor) {
        self.0.insert(key.into(), entry);
    }

    pub fn with_entry(mut self, key: impl Into<String>, entry: EntryDescriptor) -> Self {
        self.insert(key, entry);
        self
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &EntryDescriptor)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value(json: serde_json::Value) -> ContentValue {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_content_map_parses_reserved_keys() {
        let raw = value(json!({
            "db_one": {
                "element_name": "add",
                "inner_text": "value",
                "name": "db_one",
                "port": 1433,
                "content": {
                    "inner": { "element_name": "opt", "enabled": true }
                }
            }
        }));

        let content = ContentMap::from_value(&raw).unwrap();
        let (key, entry) = content.entries().next().unwrap();
        assert_eq!(key, "db_one");
        assert_eq!(entry.element_name, "add");
        assert_eq!(entry.inner_text.as_deref(), Some("value"));

        let attrs: Vec<(&str, &str)> = entry
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(attrs, vec![("name", "db_one"), ("port", "1433")]);

        let nested = entry.content.as_ref().unwrap();
        let (_, inner) = nested.entries().next().unwrap();
        assert_eq!(inner.element_name, "opt");
        assert_eq!(inner.attributes.get("enabled").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_content_map_preserves_declaration_order() {
        let raw = value(json!({
            "z": { "element_name": "z" },
            "a": { "element_name": "a" },
            "m": { "element_name": "m" }
        }));
        let content = ContentMap::from_value(&raw).unwrap();
        let keys: Vec<&str> = content.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_missing_element_name_is_rejected() {
        let raw = value(json!({ "db": { "name": "x" } }));
        let err = ContentMap::from_value(&raw).unwrap_err();
        assert!(err.to_string().contains("missing required key 'element_name'"));

        let nested = value(json!({
            "db": { "element_name": "add", "content": { "inner": { "x": "1" } } }
        }));
        let err = ContentMap::from_value(&nested).unwrap_err();
        assert!(err.to_string().contains("'db.content.inner'"));
    }

    #[test]
    fn test_non_table_entries_are_rejected() {
        let raw = value(json!({ "db": "add" }));
        assert!(matches!(
            ContentMap::from_value(&raw),
            Err(Error::InvalidContent { .. })
        ));

        let raw = value(json!({ "db": { "element_name": "add", "content": "x" } }));
        assert!(ContentMap::from_value(&raw).is_err());

        let raw = value(json!({ "db": { "element_name": ["add"] } }));
        assert!(ContentMap::from_value(&raw).is_err());
    }

    #[test]
    fn test_attribute_map_coerces_scalars() {
        let raw = value(json!({ "x": 1, "enabled": false, "name": "db" }));
        let attrs = AttributeMap::from_value(&raw).unwrap();
        let pairs: Vec<(&str, &str)> = attrs.iter().collect();
        assert_eq!(pairs, vec![("x", "1"), ("enabled", "false"), ("name", "db")]);
    }

    #[test]
    fn test_attribute_map_rejects_nested_values() {
        let raw = value(json!({ "x": { "y": "1" } }));
        assert!(AttributeMap::from_value(&raw).is_err());
        assert!(AttributeMap::from_value(&value(json!("x"))).is_err());
    }

    #[test]
    fn test_xml_names() {
        for name in ["add", "system.web", "xmlns:x", "_id", "a-1", "ünïcode"] {
            assert!(is_xml_name(name), "{name}");
        }
        for name in ["", "bad name", "a b", "1st", "-x", "a<b", "a=\"1\""] {
            assert!(!is_xml_name(name), "{name}");
        }
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let raw = value(json!({ "e": { "element_name": "bad name" } }));
        let err = ContentMap::from_value(&raw).unwrap_err();
        assert!(matches!(err, Error::InvalidContent { .. }));
        assert!(err.to_string().contains("'bad name' is not a valid XML name"));

        let raw = value(json!({ "e": { "element_name": "add", "a b": "1" } }));
        let err = ContentMap::from_value(&raw).unwrap_err();
        assert!(err.to_string().contains("'a b' is not a valid XML name"));

        let raw = value(json!({ "e": { "element_name": "add", "content": {
            "inner": { "element_name": " opt" }
        } } }));
        assert!(ContentMap::from_value(&raw).is_err());

        let raw = value(json!({ "a b": "1" }));
        assert!(matches!(
            AttributeMap::from_value(&raw),
            Err(Error::InvalidContent { .. })
        ));
    }

    #[test]
    fn test_reserved_keys() {
        assert!(is_reserved("element_name"));
        assert!(is_reserved("inner_text"));
        assert!(is_reserved("content"));
        assert!(!is_reserved("name"));
    }
}
