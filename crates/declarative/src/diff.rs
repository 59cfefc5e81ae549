//! Diff computation for resources

use crate::resource::Resource;
use crate::types::ResourceState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A diff between current and desired state of a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDiff {
    /// Unique identifier of the resource
    pub resource_id: String,
    /// Type of the resource
    pub resource_type: String,
    /// Object the resource writes to
    pub target: String,
    /// Human-readable description
    pub description: String,
    /// Current state, `Unknown` when it could not be read
    pub current: ResourceState,
    /// Desired state
    pub desired: ResourceState,
    /// Why the current state could not be determined
    pub error: Option<String>,
}

impl ResourceDiff {
    /// Create a diff from a resource, returning None if no changes needed
    ///
    /// A failure to read the current state is itself a diff, so that a
    /// broken resource is reported instead of looking converged.
    pub fn from_resource<R: Resource + ?Sized>(resource: &R) -> Option<Self> {
        let desired = resource.desired_state();
        let (current, error) = match resource.current_state() {
            Ok(current) if current == desired => return None,
            Ok(current) => (current, None),
            Err(e) => (ResourceState::Unknown, Some(format!("{e:#}"))),
        };

        Some(Self {
            resource_id: resource.id(),
            resource_type: resource.resource_type().to_string(),
            target: resource.target(),
            description: resource.description(),
            current,
            desired,
            error,
        })
    }

    /// Check if this diff represents an addition
    pub fn is_addition(&self) -> bool {
        matches!(
            (&self.current, &self.desired),
            (ResourceState::Absent, ResourceState::Present { .. })
        )
    }

    /// Check if this diff represents a removal
    pub fn is_removal(&self) -> bool {
        matches!(
            (&self.current, &self.desired),
            (ResourceState::Present { .. }, ResourceState::Absent)
        )
    }

    /// Check if the current state could not be read
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Compute diffs for a list of resources
///
/// Returns only resources that differ from their desired state, or whose
/// state could not be read.
pub fn compute_diffs<'a, I, R>(resources: I) -> Vec<ResourceDiff>
where
    I: IntoIterator<Item = &'a R>,
    R: Resource + ?Sized + 'a,
{
    resources
        .into_iter()
        .filter_map(|r| ResourceDiff::from_resource(r))
        .collect()
}

/// Diff summary statistics
#[derive(Debug, Clone, Default)]
pub struct DiffSummary {
    /// Number of resources to add
    pub additions: usize,
    /// Number of resources to remove
    pub removals: usize,
    /// Number of resources to modify
    pub modifications: usize,
    /// Number of resources whose state could not be read
    pub errors: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[ResourceDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            if diff.is_error() {
                summary.errors += 1;
            } else if diff.is_addition() {
                summary.additions += 1;
            } else if diff.is_removal() {
                summary.removals += 1;
            } else {
                summary.modifications += 1;
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.removals + self.modifications
    }
}

/// Group diffs by the target they write to
///
/// Targets keep the order in which they first appear, as do the diffs
/// within each target.
pub fn group_by_target(diffs: &[ResourceDiff]) -> Vec<(&str, Vec<&ResourceDiff>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&ResourceDiff>)> = Vec::new();
    for diff in diffs {
        let slot = *index.entry(diff.target.as_str()).or_insert_with(|| {
            groups.push((diff.target.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(diff);
    }
    groups
}
