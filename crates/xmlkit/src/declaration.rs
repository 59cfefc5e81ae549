//! Bytes-in, bytes-out entry points for one declared transform.
//!
//! A [`Declaration`] owns nothing but the validated declaration. Every call
//! parses a fresh document from the caller's bytes and drops it afterwards,
//! so the caller keeps sole ownership of file I/O and of serializing access
//! to a file shared by several declarations.

use log::debug;

use crate::content::ContentValue;
use crate::document::{Document, Format};
use crate::error::{Error, Result};
use crate::selector::Selector;
use crate::transform::{self, MutationResult, Report, Transform, TransformKind};

/// New document bytes produced by a mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBack {
    pub bytes: Vec<u8>,
    pub matched: usize,
    /// `false` when the document already satisfied the declaration
    pub changed: bool,
}

/// A validated transform bound to its selector and output format.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub selector: Selector,
    pub transform: Transform,
    pub format: Format,
}

impl Declaration {
    pub fn new(
        xpath: &str,
        kind: TransformKind,
        content: Option<&ContentValue>,
        prevent_format: bool,
    ) -> Result<Self> {
        Ok(Self {
            selector: Selector::parse(xpath)?,
            transform: Transform::new(kind, content)?,
            format: Format::from_prevent_format(prevent_format),
        })
    }

    pub fn kind(&self) -> TransformKind {
        self.transform.kind()
    }

    /// Whether the document already satisfies this declaration.
    pub fn is_satisfied(&self, bytes: &[u8]) -> Result<bool> {
        let document = Document::parse(bytes)?;
        transform::check(&document, &self.selector, &self.transform)
    }

    /// Detailed, read-only evaluation.
    pub fn inspect(&self, bytes: &[u8]) -> Result<Report> {
        let document = Document::parse(bytes)?;
        transform::inspect(&document, &self.selector, &self.transform)
    }

    /// Produce bytes that satisfy a `SetAttributes` or `Replace` declaration.
    pub fn create_or_update(&self, bytes: &[u8]) -> Result<WriteBack> {
        if matches!(self.transform, Transform::Remove) {
            return Err(Error::InvalidTransform {
                message: "Invalid transform for create".to_string(),
            });
        }
        self.mutate(bytes)
    }

    /// Produce bytes with every match of a `Remove` declaration deleted.
    pub fn remove(&self, bytes: &[u8]) -> Result<WriteBack> {
        if !matches!(self.transform, Transform::Remove) {
            return Err(Error::InvalidTransform {
                message: "Invalid transform for destroy".to_string(),
            });
        }
        self.mutate(bytes)
    }

    fn mutate(&self, bytes: &[u8]) -> Result<WriteBack> {
        let mut document = Document::parse(bytes)?;
        let MutationResult { matched, changed } =
            transform::apply(&mut document, &self.selector, &self.transform)?;

        if !changed {
            debug!("{} {} already holds, leaving bytes untouched", self.kind(), self.selector);
            return Ok(WriteBack {
                bytes: bytes.to_vec(),
                matched,
                changed,
            });
        }

        Ok(WriteBack {
            bytes: document.to_bytes(self.format)?,
            matched,
            changed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const WEB_CONFIG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<configuration>
  <connectionStrings>
    <add name="Old" connectionString="x" />
  </connectionStrings>
  <appSettings>
    <add key="mode" value="debug" />
  </appSettings>
</configuration>
"#;

    fn content(value: serde_json::Value) -> ContentValue {
        serde_json::from_value(value).unwrap()
    }

    fn replace_connection_strings(prevent_format: bool) -> Declaration {
        let content = content(json!({
            "db_one": { "element_name": "add", "name": "db_one", "connectionString": "cs1" },
            "db_two": { "element_name": "add", "name": "db_two", "connectionString": "cs2" }
        }));
        Declaration::new(
            "//connectionStrings",
            TransformKind::Replace,
            Some(&content),
            prevent_format,
        )
        .unwrap()
    }

    #[test]
    fn test_replace_round_trip() {
        let decl = replace_connection_strings(false);
        let input = WEB_CONFIG.as_bytes();
        assert!(!decl.is_satisfied(input).unwrap());

        let out = decl.create_or_update(input).unwrap();
        assert!(out.changed);
        assert_eq!(out.matched, 1);
        assert!(decl.is_satisfied(&out.bytes).unwrap());

        let text = String::from_utf8(out.bytes.clone()).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(text.contains(
            "    <connectionStrings>\n        <add name=\"db_one\" connectionString=\"cs1\"/>"
        ));
        assert!(!text.contains("Old"));

        let again = decl.create_or_update(&out.bytes).unwrap();
        assert!(!again.changed);
        assert_eq!(again.bytes, out.bytes);
    }

    #[test]
    fn test_prevent_format_keeps_untouched_layout() {
        let content = content(json!({ "value": "release" }));
        let decl = Declaration::new(
            "//appSettings/add[@key='mode']",
            TransformKind::SetAttributes,
            Some(&content),
            true,
        )
        .unwrap();

        let out = decl.create_or_update(WEB_CONFIG.as_bytes()).unwrap();
        let text = String::from_utf8(out.bytes).unwrap();
        assert!(text.contains("\n  <connectionStrings>\n    <add name=\"Old\""));
        assert!(text.contains("<add key=\"mode\" value=\"release\"/>"));
    }

    #[test]
    fn test_prevent_format_keeps_trailing_newline() {
        let content = content(json!({ "x": "1" }));
        let decl = Declaration::new("/a", TransformKind::SetAttributes, Some(&content), true)
            .unwrap();

        let out = decl
            .create_or_update(b"<?xml version=\"1.0\"?>\n<a x=\"0\">\n  <b/>\n</a>\n")
            .unwrap();
        assert_eq!(
            String::from_utf8(out.bytes).unwrap(),
            "<?xml version=\"1.0\"?>\n<a x=\"1\">\n  <b/>\n</a>\n"
        );
    }

    #[test]
    fn test_replace_rejects_names_that_cannot_be_written() {
        let content = content(json!({ "e": { "element_name": "bad name", "a b": "1" } }));
        let err = Declaration::new("//a", TransformKind::Replace, Some(&content), false)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidContent { .. }));
    }

    #[test]
    fn test_remove_declaration() {
        let decl =
            Declaration::new("//connectionStrings/add", TransformKind::Remove, None, false).unwrap();
        assert!(!decl.is_satisfied(WEB_CONFIG.as_bytes()).unwrap());

        let out = decl.remove(WEB_CONFIG.as_bytes()).unwrap();
        assert_eq!(out.matched, 1);
        assert!(decl.is_satisfied(&out.bytes).unwrap());

        let report = decl.inspect(&out.bytes).unwrap();
        assert_eq!(report.matched, 0);
    }

    #[test]
    fn test_operation_routing() {
        let remove = Declaration::new("//add", TransformKind::Remove, None, false).unwrap();
        let err = remove.create_or_update(WEB_CONFIG.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid transform for create");

        let replace = replace_connection_strings(false);
        let err = replace.remove(WEB_CONFIG.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid transform for destroy");
    }

    #[test]
    fn test_errors_propagate() {
        let decl = replace_connection_strings(false);
        assert!(matches!(
            decl.is_satisfied(b"<configuration>"),
            Err(Error::MalformedDocument { .. })
        ));
        assert!(matches!(
            decl.create_or_update(b"<configuration/>"),
            Err(Error::NoMatch { .. })
        ));
        assert!(matches!(
            Declaration::new("//add[", TransformKind::Remove, None, false),
            Err(Error::InvalidExpression { .. })
        ));
    }
}
