//! Declarative XML transforms.
//!
//! A transform names elements with an XPath-style [`Selector`] and states
//! what must hold for them:
//!
//! - `Remove`: no element matches
//! - `SetAttributes`: every match carries the declared attribute values
//! - `Replace`: every match has exactly the declared children
//!
//! [`Declaration`] is the bytes-in/bytes-out boundary used by callers that
//! own file access. The lower-level [`transform`] functions work on a parsed
//! [`Document`].
//!
//! ```
//! use xmlkit::{Declaration, TransformKind};
//!
//! let decl = Declaration::new("//add[@key='mode']", TransformKind::Remove, None, false)?;
//! let out = decl.remove(br#"<appSettings><add key="mode"/></appSettings>"#)?;
//! assert!(decl.is_satisfied(&out.bytes)?);
//! # Ok::<(), xmlkit::Error>(())
//! ```

pub mod builder;
pub mod content;
pub mod declaration;
pub mod document;
pub mod error;
pub mod fingerprint;
pub mod selector;
pub mod transform;

pub use content::{AttributeMap, ContentMap, ContentValue, EntryDescriptor};
pub use declaration::{Declaration, WriteBack};
pub use document::{Document, Element, ElementPath, Format};
pub use error::{Error, ErrorCategory, Result};
pub use fingerprint::Fingerprint;
pub use selector::Selector;
pub use transform::{Drift, MutationResult, Report, Transform, TransformKind};
