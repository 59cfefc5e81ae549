//! Error types for XML transform operations.
//!
//! Every error is fatal at the engine boundary: parsing and selection are
//! deterministic, so retrying an operation never changes its outcome.
//! Categories exist so callers can tell a misdeclared resource apart from
//! a broken document.

use crate::transform::TransformKind;
use thiserror::Error;

/// Result type alias for XML transform operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of transform errors for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The declared resource itself is wrong (selector, content, transform).
    Declaration,
    /// The target document could not be read or written.
    Document,
    /// The selector matched nothing where a match is mandatory.
    Target,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Declaration => "Invalid transform declaration",
            Self::Document => "Unusable XML document",
            Self::Target => "Transform target not found",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Declaration => "Fix the xpath, transform or content in the manifest",
            Self::Document => "Check that the file is well-formed UTF-8 XML",
            Self::Target => "Verify the xpath against the file with `xmlconverge inspect`",
        }
    }
}

/// Errors that can occur while checking or applying a transform.
#[derive(Debug, Error)]
pub enum Error {
    /// The selector expression could not be parsed
    #[error("invalid xpath '{expression}': {message}")]
    InvalidExpression {
        /// The expression as declared
        expression: String,
        /// What went wrong, with the byte offset when known
        message: String,
    },

    /// The document bytes are not well-formed XML
    #[error("malformed XML document: {message}")]
    MalformedDocument {
        /// Parser diagnostics
        message: String,
    },

    /// A transform that needs a target matched zero elements
    #[error("Unable to perform {transform} transform, no match for xpath: {xpath}")]
    NoMatch {
        /// The transform that was attempted
        transform: TransformKind,
        /// The selector that matched nothing
        xpath: String,
    },

    /// The content descriptor is missing, superfluous or malformed
    #[error("invalid content: {message}")]
    InvalidContent {
        /// Which entry is wrong and why
        message: String,
    },

    /// An unknown transform name, or a transform routed to the wrong operation
    #[error("{message}")]
    InvalidTransform {
        /// Description of the mismatch
        message: String,
    },

    /// Writing the document back to bytes failed
    #[error("failed to serialize XML document: {0}")]
    Serialize(String),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidExpression { .. }
            | Error::InvalidContent { .. }
            | Error::InvalidTransform { .. } => ErrorCategory::Declaration,
            Error::MalformedDocument { .. } | Error::Serialize(_) => ErrorCategory::Document,
            Error::NoMatch { .. } => ErrorCategory::Target,
        }
    }

    pub(crate) fn invalid_content(message: impl Into<String>) -> Self {
        Error::InvalidContent {
            message: message.into(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedDocument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_message_names_transform_and_xpath() {
        let err = Error::NoMatch {
            transform: TransformKind::SetAttributes,
            xpath: "//add[@name='db']".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unable to perform SetAttributes transform, no match for xpath: //add[@name='db']"
        );
        assert_eq!(err.category(), ErrorCategory::Target);
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            Error::invalid_content("x").category(),
            ErrorCategory::Declaration
        );
        assert_eq!(Error::malformed("x").category(), ErrorCategory::Document);
        assert_eq!(
            Error::Serialize("x".into()).category(),
            ErrorCategory::Document
        );
    }
}
