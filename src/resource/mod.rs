//! Resources converged by xmlconverge
//!
//! Each declared transform becomes one [`XmlTransform`]. The generic
//! resource machinery lives in the `declarative` crate and is re-exported
//! here.

pub use declarative::{ApplyContext, ApplyResult, Resource, ResourceState};

pub mod xml_transform;

pub use xml_transform::XmlTransform;
