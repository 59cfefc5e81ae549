//! Materializes declared content as real elements.

use crate::content::ContentMap;
use crate::document::Element;

/// Append one element per content entry under `parent`, in declaration order.
///
/// Reserved keys are already split out of `attributes` by the content
/// parser, so every attribute here is written as-is.
pub fn materialize(parent: &mut Element, content: &ContentMap) {
    for (_, entry) in content.entries() {
        let mut element = Element::new(entry.element_name.as_str());
        if let Some(text) = &entry.inner_text {
            element.set_text(text);
        }
        for (name, value) in &entry.attributes {
            element.set_attribute(name, value);
        }

        let element = parent.append_element(element);
        if let Some(nested) = &entry.content {
            materialize(element, nested);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::EntryDescriptor;
    use crate::fingerprint::{fingerprint_children, fingerprint_content};

    #[test]
    fn test_materialize_in_declaration_order() {
        let content = ContentMap::new()
            .with_entry(
                "db_one",
                EntryDescriptor::new("add")
                    .with_text("value")
                    .with_attribute("name", "db_one")
                    .with_attribute("connectionString", "cs1"),
            )
            .with_entry(
                "db_two",
                EntryDescriptor::new("add").with_attribute("name", "db_two"),
            );

        let mut parent = Element::new("connectionStrings");
        materialize(&mut parent, &content);

        let children: Vec<&Element> = parent.elements().collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name, "add");
        assert_eq!(children[0].text(), "value");
        assert_eq!(children[0].attribute("name"), Some("db_one"));
        assert_eq!(children[0].attributes[1].name, "connectionString");
        assert_eq!(children[1].attribute("name"), Some("db_two"));
        assert_eq!(children[1].text(), "");
    }

    #[test]
    fn test_entry_keys_are_not_written() {
        let content = ContentMap::new().with_entry("key_only", EntryDescriptor::new("b"));
        let mut parent = Element::new("a");
        materialize(&mut parent, &content);

        let child = parent.elements().next().unwrap();
        assert_eq!(child.name, "b");
        assert!(child.attributes.is_empty());
    }

    #[test]
    fn test_materialize_nested_content() {
        let content = ContentMap::new().with_entry(
            "outer",
            EntryDescriptor::new("group").with_content(
                ContentMap::new()
                    .with_entry("one", EntryDescriptor::new("item").with_text("1"))
                    .with_entry("two", EntryDescriptor::new("item").with_text("2")),
            ),
        );

        let mut parent = Element::new("root");
        materialize(&mut parent, &content);

        let group = parent.elements().next().unwrap();
        let texts: Vec<&str> = group.elements().map(Element::text).collect();
        assert_eq!(texts, vec!["1", "2"]);

        // What was built must fingerprint like what was declared.
        assert_eq!(fingerprint_children(&parent), fingerprint_content(&content));
    }
}
