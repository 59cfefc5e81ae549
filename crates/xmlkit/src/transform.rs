//! The three transform kinds and their check/apply semantics.
//!
//! `check` and `inspect` never mutate. `apply` mutates every match with
//! the same declared payload; callers are expected to `check` first and
//! to discard the document if `apply` fails.

use std::fmt;
use std::str::FromStr;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::builder::materialize;
use crate::content::{AttributeMap, ContentMap, ContentValue};
use crate::document::{Document, ElementPath};
use crate::error::{Error, Result};
use crate::fingerprint::{fingerprint_children, fingerprint_content};
use crate::selector::Selector;

/// Name of a transform, as declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformKind {
    Remove,
    SetAttributes,
    Replace,
}

impl TransformKind {
    pub const ALL: [TransformKind; 3] = [Self::Remove, Self::SetAttributes, Self::Replace];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remove => "Remove",
            Self::SetAttributes => "SetAttributes",
            Self::Replace => "Replace",
        }
    }

    /// Whether this transform takes a content payload.
    pub fn requires_content(&self) -> bool {
        !matches!(self, Self::Remove)
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidTransform {
                message: format!(
                    "unknown transform '{s}', expected one of: Remove, SetAttributes, Replace"
                ),
            })
    }
}

/// A validated transform with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transform {
    Remove,
    SetAttributes(AttributeMap),
    Replace(ContentMap),
}

impl Transform {
    /// Validate a raw payload against the transform kind.
    pub fn new(kind: TransformKind, content: Option<&ContentValue>) -> Result<Self> {
        match (kind, content) {
            (TransformKind::Remove, None) => Ok(Self::Remove),
            (TransformKind::Remove, Some(_)) => Err(Error::invalid_content(
                "Remove does not take content",
            )),
            (kind, None) => Err(Error::invalid_content(format!("{kind} requires content"))),
            (TransformKind::SetAttributes, Some(value)) => {
                Ok(Self::SetAttributes(AttributeMap::from_value(value)?))
            }
            (TransformKind::Replace, Some(value)) => Ok(Self::Replace(ContentMap::from_value(value)?)),
        }
    }

    pub fn kind(&self) -> TransformKind {
        match self {
            Self::Remove => TransformKind::Remove,
            Self::SetAttributes(_) => TransformKind::SetAttributes,
            Self::Replace(_) => TransformKind::Replace,
        }
    }
}

/// The first match that does not hold, rendered for humans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    pub path: ElementPath,
    pub expected: String,
    pub actual: String,
}

/// Read-only evaluation of a transform against a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub kind: TransformKind,
    /// Elements the selector matched
    pub matched: usize,
    /// Matches that do not hold; all of them for `Remove`
    pub unsatisfied: usize,
    pub drift: Option<Drift>,
}

impl Report {
    pub fn is_satisfied(&self) -> bool {
        self.unsatisfied == 0
    }
}

/// Outcome of [`apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationResult {
    pub matched: usize,
    pub changed: bool,
}

fn matches_or_fail(document: &Document, selector: &Selector, kind: TransformKind) -> Result<Vec<ElementPath>> {
    let paths = selector.select(document);
    if paths.is_empty() && kind.requires_content() {
        return Err(Error::NoMatch {
            transform: kind,
            xpath: selector.to_string(),
        });
    }
    Ok(paths)
}

fn render_attributes<'a>(pairs: impl Iterator<Item = (&'a str, Option<&'a str>)>) -> String {
    pairs
        .map(|(name, value)| match value {
            Some(value) => format!("{name}=\"{value}\""),
            None => format!("{name} (unset)"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Evaluate a transform without mutating the document.
///
/// `SetAttributes` and `Replace` fail with [`Error::NoMatch`] when the
/// selector matches nothing.
pub fn inspect(document: &Document, selector: &Selector, transform: &Transform) -> Result<Report> {
    let kind = transform.kind();
    let paths = matches_or_fail(document, selector, kind)?;

    let mut unsatisfied = 0;
    let mut drift = None;
    for path in &paths {
        let Some(element) = document.element(path) else {
            continue;
        };

        let found = match transform {
            Transform::Remove => Some(("absent".to_string(), format!("<{}>", element.name))),
            Transform::SetAttributes(attributes) => {
                let holds = attributes
                    .iter()
                    .all(|(name, value)| element.attribute(name) == Some(value));
                (!holds).then(|| {
                    (
                        render_attributes(attributes.iter().map(|(n, v)| (n, Some(v)))),
                        render_attributes(attributes.iter().map(|(n, _)| (n, element.attribute(n)))),
                    )
                })
            }
            Transform::Replace(content) => {
                let expected = fingerprint_content(content);
                let actual = fingerprint_children(element);
                (expected != actual).then(|| (format!("#{}", expected.digest()), format!("#{}", actual.digest())))
            }
        };

        if let Some((expected, actual)) = found {
            trace!("{kind} does not hold at {path}: expected {expected}, found {actual}");
            unsatisfied += 1;
            drift.get_or_insert(Drift {
                path: path.clone(),
                expected,
                actual,
            });
        }
    }

    Ok(Report {
        kind,
        matched: paths.len(),
        unsatisfied,
        drift,
    })
}

/// Whether the document already satisfies the transform.
pub fn check(document: &Document, selector: &Selector, transform: &Transform) -> Result<bool> {
    inspect(document, selector, transform).map(|report| report.is_satisfied())
}

/// Mutate every match so the transform holds.
///
/// Matches are visited in reverse document order: removing or rebuilding
/// a later element never shifts the index path of an earlier one, and
/// descendants are handled before their ancestors.
pub fn apply(document: &mut Document, selector: &Selector, transform: &Transform) -> Result<MutationResult> {
    let kind = transform.kind();
    let paths = matches_or_fail(document, selector, kind)?;

    if matches!(transform, Transform::Remove) && paths.iter().any(ElementPath::is_root) {
        return Err(Error::InvalidTransform {
            message: format!(
                "Remove cannot delete the root element <{}> (xpath: {selector})",
                document.root.name
            ),
        });
    }

    let mut changed = false;
    for path in paths.iter().rev() {
        match transform {
            Transform::Remove => {
                changed |= document.remove(path).is_some();
            }
            Transform::SetAttributes(attributes) => {
                if let Some(element) = document.element_mut(path) {
                    for (name, value) in attributes.iter() {
                        changed |= element.set_attribute(name, value);
                    }
                }
            }
            Transform::Replace(content) => {
                if let Some(element) = document.element_mut(path) {
                    changed |= fingerprint_children(element) != fingerprint_content(content);
                    element.clear_children();
                    materialize(element, content);
                }
            }
        }
    }

    debug!(
        "{kind} applied to {} match(es) of {selector} (changed: {changed})",
        paths.len()
    );

    Ok(MutationResult {
        matched: paths.len(),
        changed,
    })
}
