//! XML transform resource - one declared transform against one file

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use xmlkit::{Declaration, Report, TransformKind, WriteBack};

use super::{ApplyContext, ApplyResult, Resource, ResourceState};
use crate::config::TransformSpec;

/// A transform that must hold for an XML file
#[derive(Debug, Clone)]
pub struct XmlTransform {
    /// Declared name, unique within a manifest
    pub name: String,
    /// File the transform reads and writes
    pub path: PathBuf,
    pub declaration: Declaration,
}

impl XmlTransform {
    pub fn new(name: impl Into<String>, path: impl AsRef<Path>, declaration: Declaration) -> Self {
        Self {
            name: name.into(),
            path: path.as_ref().to_path_buf(),
            declaration,
        }
    }

    /// Build from a validated manifest entry
    ///
    /// Fails when the xpath does not parse or the content does not fit the
    /// transform.
    pub fn from_spec(spec: &TransformSpec) -> xmlkit::Result<Self> {
        let declaration = Declaration::new(
            &spec.xpath,
            spec.kind,
            spec.content.as_ref(),
            spec.prevent_format,
        )?;
        Ok(Self::new(&spec.name, &spec.path, declaration))
    }

    pub fn kind(&self) -> TransformKind {
        self.declaration.kind()
    }

    fn read(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).with_context(|| format!("Failed to read {}", self.path.display()))
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        fs::write(&self.path, bytes)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    /// Evaluate the transform against the file as it is on disk
    pub fn inspect(&self) -> Result<Report> {
        let bytes = self.read()?;
        self.declaration
            .inspect(&bytes)
            .with_context(|| format!("Failed to evaluate {} against {}", self.name, self.path.display()))
    }

    /// Run the transform over `bytes` without touching the file
    ///
    /// Lets several transforms on one file be chained in memory.
    pub fn transform_bytes(&self, bytes: &[u8]) -> Result<WriteBack> {
        let result = match self.kind() {
            TransformKind::Remove => self.declaration.remove(bytes),
            TransformKind::SetAttributes | TransformKind::Replace => {
                self.declaration.create_or_update(bytes)
            }
        };
        result.with_context(|| format!("Failed to apply {} to {}", self.name, self.path.display()))
    }
}

impl Resource for XmlTransform {
    fn id(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        format!(
            "{} {} in {}",
            self.kind(),
            self.declaration.selector,
            self.path.display()
        )
    }

    fn resource_type(&self) -> &'static str {
        "xml_transform"
    }

    fn target(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    fn current_state(&self) -> Result<ResourceState> {
        let report = self.inspect()?;

        if self.kind() == TransformKind::Remove {
            return Ok(if report.matched == 0 {
                ResourceState::Absent
            } else {
                ResourceState::Present {
                    details: Some(format!("{} matching", report.matched)),
                }
            });
        }

        Ok(match report.drift {
            None => ResourceState::Present { details: None },
            Some(drift) if report.unsatisfied > 1 => ResourceState::Modified {
                from: format!("{} (+{} more)", drift.actual, report.unsatisfied - 1),
                to: drift.expected,
            },
            Some(drift) => ResourceState::Modified {
                from: drift.actual,
                to: drift.expected,
            },
        })
    }

    fn desired_state(&self) -> ResourceState {
        match self.kind() {
            TransformKind::Remove => ResourceState::Absent,
            TransformKind::SetAttributes | TransformKind::Replace => {
                ResourceState::Present { details: None }
            }
        }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let bytes = self.read()?;
        let write_back = self.transform_bytes(&bytes)?;
        if !write_back.changed {
            log::debug!("{} already holds for {}", self.name, self.path.display());
            return Ok(ApplyResult::NoChange);
        }

        self.write(&write_back.bytes)?;
        log::info!(
            "{}: {} {} element(s) in {}",
            self.name,
            self.kind(),
            write_back.matched,
            self.path.display()
        );

        Ok(match self.kind() {
            TransformKind::Remove => ApplyResult::Removed,
            TransformKind::SetAttributes | TransformKind::Replace => ApplyResult::Modified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use xmlkit::ContentValue;

    const WEB_CONFIG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<configuration>
  <system.web>
    <compilation debug="true" targetFramework="4.8" />
  </system.web>
  <appSettings>
    <add key="mode" value="debug" />
    <add key="region" value="eu" />
  </appSettings>
</configuration>
"#;

    fn setup() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("web.config");
        fs::write(&path, WEB_CONFIG).unwrap();
        (dir, path)
    }

    fn content(toml_text: &str) -> ContentValue {
        toml::from_str(toml_text).unwrap()
    }

    fn set_mode(path: &Path) -> XmlTransform {
        let content = content("value = \"release\"");
        let declaration = Declaration::new(
            "//appSettings/add[@key='mode']",
            TransformKind::SetAttributes,
            Some(&content),
            false,
        )
        .unwrap();
        XmlTransform::new("set_mode", path, declaration)
    }

    fn drop_debug(path: &Path) -> XmlTransform {
        let declaration = Declaration::new(
            "//compilation[@debug='true']",
            TransformKind::Remove,
            None,
            false,
        )
        .unwrap();
        XmlTransform::new("drop_debug", path, declaration)
    }

    #[test]
    fn test_identity() {
        let (_dir, path) = setup();
        let resource = set_mode(&path);
        assert_eq!(resource.id(), "set_mode");
        assert_eq!(resource.resource_type(), "xml_transform");
        assert_eq!(resource.target(), path.to_string_lossy());
        assert!(resource.description().starts_with("SetAttributes //appSettings/add"));
    }

    #[test]
    fn test_set_attributes_converges() {
        let (_dir, path) = setup();
        let resource = set_mode(&path);

        assert_eq!(
            resource.current_state().unwrap(),
            ResourceState::Modified {
                from: "value=\"debug\"".into(),
                to: "value=\"release\"".into(),
            }
        );
        assert!(resource.needs_apply().unwrap());

        let mut ctx = ApplyContext::default();
        assert_eq!(resource.apply(&mut ctx).unwrap(), ApplyResult::Modified);

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains(r#"<add key="mode" value="release"/>"#));
        assert!(written.contains(r#"<add key="region" value="eu"/>"#));

        assert_eq!(resource.current_state().unwrap(), resource.desired_state());
        assert_eq!(resource.apply(&mut ctx).unwrap(), ApplyResult::NoChange);
    }

    #[test]
    fn test_remove_converges() {
        let (_dir, path) = setup();
        let resource = drop_debug(&path);

        assert_eq!(
            resource.current_state().unwrap(),
            ResourceState::Present {
                details: Some("1 matching".into())
            }
        );
        assert_eq!(resource.desired_state(), ResourceState::Absent);

        let mut ctx = ApplyContext::default();
        assert_eq!(resource.apply(&mut ctx).unwrap(), ApplyResult::Removed);
        assert!(!fs::read_to_string(&path).unwrap().contains("compilation"));
        assert_eq!(resource.current_state().unwrap(), ResourceState::Absent);
        assert_eq!(resource.apply(&mut ctx).unwrap(), ApplyResult::NoChange);
    }

    #[test]
    fn test_replace_reports_digests() {
        let (_dir, path) = setup();
        let content = content(
            r#"
[only]
element_name = "add"
key = "mode"
value = "release"
"#,
        );
        let declaration =
            Declaration::new("//appSettings", TransformKind::Replace, Some(&content), false)
                .unwrap();
        let resource = XmlTransform::new("replace_settings", &path, declaration);

        let ResourceState::Modified { from, to } = resource.current_state().unwrap() else {
            panic!("expected drift");
        };
        assert!(from.starts_with('#') && to.starts_with('#'));
        assert_ne!(from, to);

        let mut ctx = ApplyContext::default();
        assert_eq!(resource.apply(&mut ctx).unwrap(), ApplyResult::Modified);
        assert_eq!(resource.current_state().unwrap(), resource.desired_state());
        assert!(!fs::read_to_string(&path).unwrap().contains("region"));
    }

    #[test]
    fn test_dry_run_never_writes() {
        let (_dir, path) = setup();
        let resource = set_mode(&path);

        let mut ctx = ApplyContext::new(true, false);
        let result = resource.apply(&mut ctx).unwrap();
        assert!(matches!(result, ApplyResult::Skipped { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), WEB_CONFIG);
    }

    #[test]
    fn test_no_match_fails_without_writing() {
        let (_dir, path) = setup();
        let content = content("value = \"1\"");
        let declaration = Declaration::new(
            "//appSettings/add[@key='missing']",
            TransformKind::SetAttributes,
            Some(&content),
            false,
        )
        .unwrap();
        let resource = XmlTransform::new("missing", &path, declaration);

        let err = resource.apply(&mut ApplyContext::default()).unwrap_err();
        assert!(format!("{err:#}").contains("no match for xpath"));
        assert!(resource.current_state().is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), WEB_CONFIG);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let resource = drop_debug(&dir.path().join("absent.config"));
        let err = resource.current_state().unwrap_err();
        assert!(format!("{err:#}").contains("absent.config"));
    }

    #[test]
    fn test_transform_bytes_leaves_file_alone() {
        let (_dir, path) = setup();
        let resource = set_mode(&path);

        let write_back = resource.transform_bytes(WEB_CONFIG.as_bytes()).unwrap();
        assert!(write_back.changed);
        assert!(String::from_utf8(write_back.bytes.clone()).unwrap().contains("value=\"release\""));
        assert_eq!(fs::read_to_string(&path).unwrap(), WEB_CONFIG);

        let again = resource.transform_bytes(&write_back.bytes).unwrap();
        assert!(!again.changed);
    }

    #[test]
    fn test_from_spec_rejects_bad_xpath() {
        let spec = TransformSpec {
            name: "bad".into(),
            path: PathBuf::from("web.config"),
            kind: TransformKind::Remove,
            xpath: "//add[".into(),
            content: None,
            prevent_format: false,
        };
        let err = XmlTransform::from_spec(&spec).unwrap_err();
        assert!(matches!(err, xmlkit::Error::InvalidExpression { .. }));
    }
}
