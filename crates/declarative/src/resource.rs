//! The `Resource` trait
//!
//! A resource is one assertion about a target, such as "this attribute
//! holds this value in that file". It can observe whether the assertion
//! holds and make it hold.

use crate::context::ApplyContext;
use crate::types::{ApplyResult, ResourceState};
use anyhow::Result;
use std::fmt;

/// Something with an observable state that can be converged
///
/// # Example
///
/// ```
/// use declarative::{ApplyContext, ApplyResult, Resource, ResourceState};
///
/// #[derive(Debug)]
/// struct Banner {
///     path: String,
///     text: String,
/// }
///
/// impl Resource for Banner {
///     fn id(&self) -> String {
///         format!("banner:{}", self.path)
///     }
///
///     fn description(&self) -> String {
///         format!("first line of {} reads '{}'", self.path, self.text)
///     }
///
///     fn resource_type(&self) -> &'static str {
///         "banner"
///     }
///
///     fn target(&self) -> String {
///         self.path.clone()
///     }
///
///     fn current_state(&self) -> anyhow::Result<ResourceState> {
///         let content = std::fs::read_to_string(&self.path)?;
///         let first = content.lines().next().unwrap_or_default();
///         if first == self.text {
///             Ok(ResourceState::Present { details: None })
///         } else {
///             Ok(ResourceState::Modified {
///                 from: first.to_string(),
///                 to: self.text.clone(),
///             })
///         }
///     }
///
///     fn desired_state(&self) -> ResourceState {
///         ResourceState::Present { details: None }
///     }
///
///     fn apply(&self, ctx: &mut ApplyContext) -> anyhow::Result<ApplyResult> {
///         if ctx.dry_run {
///             return Ok(ApplyResult::Skipped { reason: "Dry run".into() });
///         }
///         Ok(ApplyResult::Modified)
///     }
/// }
/// ```
pub trait Resource: Send + Sync + fmt::Debug {
    /// Identifier, unique among the resources of a plan
    fn id(&self) -> String;

    fn description(&self) -> String;

    /// Short type tag shown in diffs and status output
    fn resource_type(&self) -> &'static str;

    /// Key of the object this resource reads and writes
    ///
    /// Resources sharing a target are applied one after another in
    /// declaration order; distinct targets may be applied concurrently.
    /// Defaults to the id, so nothing is shared.
    fn target(&self) -> String {
        self.id()
    }

    /// Observe the target as it is now
    ///
    /// An error means the state could not be determined, for example an
    /// unreadable target.
    fn current_state(&self) -> Result<ResourceState>;

    fn desired_state(&self) -> ResourceState;

    /// Whether `apply` would change anything
    fn needs_apply(&self) -> Result<bool> {
        Ok(self.current_state()? != self.desired_state())
    }

    /// Converge the target
    ///
    /// Must be idempotent: once the desired state holds, another call
    /// returns `NoChange` and leaves the target alone. Honors
    /// `ctx.dry_run` by returning `Skipped` without touching anything.
    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult>;
}

/// A resource stored behind a trait object
pub type BoxedResource = Box<dyn Resource>;
