//! Manifest loading and validation
//!
//! A manifest declares the transforms to converge, one `[[transform]]`
//! table each:
//!
//! ```toml
//! [settings]
//! preventformat = false
//!
//! [[transform]]
//! name = "drop_debug"
//! path = "web.config"
//! transform = "Remove"
//! xpath = "//compilation[@debug='true']"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xmlkit::{ContentValue, TransformKind};

/// Problems found while validating a parsed manifest
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
    #[error("transform #{index}: {field} is a required attribute")]
    MissingField { index: usize, field: &'static str },

    #[error("transform '{name}': {message}")]
    Invalid { name: String, message: String },

    #[error("transform '{0}' is declared more than once")]
    DuplicateName(String),
}

/// A boolean that may also be written as the string "true" or "false"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BoolLike(pub bool);

impl<'de> Deserialize<'de> for BoolLike {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => Ok(Self(b)),
            Raw::Str(s) => match s.to_ascii_lowercase().as_str() {
                "true" => Ok(Self(true)),
                "false" => Ok(Self(false)),
                _ => Err(serde::de::Error::custom(format!(
                    "expected true or false, found '{s}'"
                ))),
            },
        }
    }
}

/// Whether the declared transform should exist in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    Present,
    Absent,
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => write!(f, "present"),
            Self::Absent => write!(f, "absent"),
        }
    }
}

/// Defaults shared by every transform
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Write files back without re-indenting them
    #[serde(default)]
    pub preventformat: BoolLike,
    /// Number of files converged at once
    #[serde(default)]
    pub jobs: Option<usize>,
}

/// One `[[transform]]` table as written
///
/// Required attributes are optional here so validation can name the
/// offending entry instead of failing inside the TOML parser.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TransformDecl {
    pub name: Option<String>,
    pub path: Option<String>,
    pub transform: Option<String>,
    pub xpath: Option<String>,
    pub content: Option<ContentValue>,
    pub preventformat: Option<BoolLike>,
    pub ensure: Option<Ensure>,
}

/// The manifest file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default, rename = "transform")]
    pub transforms: Vec<TransformDecl>,
}

/// A validated transform, ready to become a resource
#[derive(Debug, Clone, PartialEq)]
pub struct TransformSpec {
    pub name: String,
    pub path: PathBuf,
    pub kind: TransformKind,
    pub xpath: String,
    pub content: Option<ContentValue>,
    pub prevent_format: bool,
}

impl Manifest {
    /// Load a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read manifest {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid manifest {}", path.display()))
    }

    /// Parse manifest text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML")
    }

    /// Check every declaration and resolve paths against `base_dir`
    ///
    /// Stops at the first invalid declaration.
    pub fn validate(&self, base_dir: &Path) -> std::result::Result<Vec<TransformSpec>, ManifestError> {
        let mut seen = HashSet::new();
        let mut specs = Vec::with_capacity(self.transforms.len());

        for (index, decl) in self.transforms.iter().enumerate() {
            let spec = decl.validate(index + 1, &self.settings, base_dir)?;
            if !seen.insert(spec.name.clone()) {
                return Err(ManifestError::DuplicateName(spec.name));
            }
            specs.push(spec);
        }

        Ok(specs)
    }
}

/// A required attribute, rejecting empty strings
fn required<'a>(
    value: Option<&'a String>,
    index: usize,
    field: &'static str,
) -> std::result::Result<&'a str, ManifestError> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or(ManifestError::MissingField { index, field })
}

impl TransformDecl {
    fn validate(
        &self,
        index: usize,
        settings: &Settings,
        base_dir: &Path,
    ) -> std::result::Result<TransformSpec, ManifestError> {
        let name = required(self.name.as_ref(), index, "name")?;
        let invalid = |message: String| ManifestError::Invalid {
            name: name.to_string(),
            message,
        };

        let path = required(self.path.as_ref(), index, "path")?;
        let transform = required(self.transform.as_ref(), index, "transform")?;
        let xpath = required(self.xpath.as_ref(), index, "xpath")?;

        let kind: TransformKind = transform.parse().map_err(|e: xmlkit::Error| invalid(e.to_string()))?;

        match (kind.requires_content(), self.content.is_some()) {
            (true, false) => {
                return Err(invalid(format!("content is required for {kind}")));
            }
            (false, true) => {
                return Err(invalid(format!("content is not allowed for {kind}")));
            }
            _ => {}
        }

        let implied = if kind == TransformKind::Remove {
            Ensure::Absent
        } else {
            Ensure::Present
        };
        // ensure may only restate what the transform implies
        if let Some(ensure) = self.ensure
            && ensure != implied
        {
            return Err(invalid(format!(
                "ensure = \"{ensure}\" contradicts the {kind} transform"
            )));
        }

        Ok(TransformSpec {
            name: name.to_string(),
            path: crate::paths::resolve(base_dir, path),
            kind,
            xpath: xpath.to_string(),
            content: self.content.clone(),
            prevent_format: self.preventformat.unwrap_or(settings.preventformat).0,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
[settings]
preventformat = "true"
jobs = 2

[[transform]]
name = "replace_connectionstrings"
path = "web.config"
transform = "Replace"
xpath = "//connectionStrings"

[transform.content.db_one]
element_name = "add"
name = "db_one"
connectionString = "Server=.;Database=one"

[transform.content.db_two]
element_name = "add"
name = "db_two"

[[transform]]
name = "drop_debug"
path = "/etc/site/web.config"
transform = "Remove"
xpath = "//compilation[@debug='true']"
preventformat = false
ensure = "absent"
"#;

    fn validate(content: &str) -> std::result::Result<Vec<TransformSpec>, ManifestError> {
        Manifest::parse(content).unwrap().validate(Path::new("/srv/site"))
    }

    #[test]
    fn test_parse_and_validate() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        assert_eq!(manifest.settings.jobs, Some(2));
        assert_eq!(manifest.transforms.len(), 2);

        let specs = manifest.validate(Path::new("/srv/site")).unwrap();
        assert_eq!(specs[0].name, "replace_connectionstrings");
        assert_eq!(specs[0].path, PathBuf::from("/srv/site/web.config"));
        assert_eq!(specs[0].kind, TransformKind::Replace);
        assert!(specs[0].prevent_format);

        assert_eq!(specs[1].path, PathBuf::from("/etc/site/web.config"));
        assert_eq!(specs[1].kind, TransformKind::Remove);
        assert!(!specs[1].prevent_format);
    }

    #[test]
    fn test_content_keeps_declaration_order() {
        let specs = validate(MANIFEST).unwrap();
        let Some(ContentValue::Table(content)) = &specs[0].content else {
            panic!("expected a content table");
        };
        let keys: Vec<&str> = content.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["db_one", "db_two"]);
    }

    #[test]
    fn test_missing_required_attribute() {
        let err = validate(
            r#"
[[transform]]
name = "no_xpath"
path = "web.config"
transform = "Remove"
"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ManifestError::MissingField {
                index: 1,
                field: "xpath"
            }
        );
        assert_eq!(err.to_string(), "transform #1: xpath is a required attribute");
    }

    #[test]
    fn test_empty_name_is_missing() {
        let err = validate(
            r#"
[[transform]]
name = "  "
path = "web.config"
transform = "Remove"
xpath = "//a"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::MissingField { field: "name", .. }));
    }

    #[test]
    fn test_unknown_transform_rejected() {
        let err = validate(
            r#"
[[transform]]
name = "bad"
path = "web.config"
transform = "Rename"
xpath = "//a"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::Invalid { ref name, .. } if name == "bad"));
        assert!(err.to_string().contains("Rename"));
    }

    #[test]
    fn test_content_required_unless_remove() {
        let err = validate(
            r#"
[[transform]]
name = "set_mode"
path = "web.config"
transform = "SetAttributes"
xpath = "//appSettings/add[@key='mode']"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("content is required for SetAttributes"));

        let err = validate(
            r#"
[[transform]]
name = "drop"
path = "web.config"
transform = "Remove"
xpath = "//a"
content = { value = "x" }
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("content is not allowed for Remove"));
    }

    #[test]
    fn test_ensure_must_match_transform() {
        let err = validate(
            r#"
[[transform]]
name = "drop"
path = "web.config"
transform = "Remove"
xpath = "//a"
ensure = "present"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("contradicts the Remove transform"));

        let err = validate(
            r#"
[[transform]]
name = "set"
path = "web.config"
transform = "SetAttributes"
xpath = "//a"
ensure = "absent"
content = { value = "x" }
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("ensure = \"absent\""));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = validate(
            r#"
[[transform]]
name = "drop"
path = "a.config"
transform = "Remove"
xpath = "//a"

[[transform]]
name = "drop"
path = "b.config"
transform = "Remove"
xpath = "//b"
"#,
        )
        .unwrap_err();
        assert_eq!(err, ManifestError::DuplicateName("drop".into()));
    }

    #[test]
    fn test_bool_like_rejects_other_strings() {
        let result = Manifest::parse(
            r#"
[settings]
preventformat = "yes"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(Manifest::parse("[settings]\nindent = 2\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.toml");
        fs::write(&path, MANIFEST).unwrap();

        let manifest = Manifest::load(&path).unwrap();
        let specs = manifest.validate(dir.path()).unwrap();
        assert_eq!(specs[0].path, dir.path().join("web.config"));
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        let err = Manifest::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("absent.toml"));
    }
}
