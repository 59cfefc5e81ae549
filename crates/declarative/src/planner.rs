//! Execution planner - groups resources by the target they write to

use crate::resource::{BoxedResource, Resource};

/// Resources that share one target, in declaration order
pub struct TargetGroup {
    pub target: String,
    pub resources: Vec<BoxedResource>,
}

/// An execution plan with resources grouped by target
///
/// Groups appear in the order their first resource was added, and each
/// group keeps its resources in the order they were added.
#[derive(Default)]
pub struct ExecutionPlan {
    pub groups: Vec<TargetGroup>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource to the group for its target
    pub fn add_resource(&mut self, resource: BoxedResource) {
        let target = resource.target();
        match self.groups.iter_mut().find(|g| g.target == target) {
            Some(group) => group.resources.push(resource),
            None => self.groups.push(TargetGroup {
                target,
                resources: vec![resource],
            }),
        }
    }

    /// Iterate over every resource, group by group
    pub fn resources(&self) -> impl Iterator<Item = &(dyn Resource + 'static)> {
        self.groups.iter().flat_map(|g| g.resources.iter().map(|r| &**r))
    }

    /// Filter plan to only include resources matching a predicate
    ///
    /// Groups left empty are dropped.
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&dyn Resource) -> bool,
    {
        let groups = self
            .groups
            .into_iter()
            .filter_map(|group| {
                let resources: Vec<BoxedResource> = group
                    .resources
                    .into_iter()
                    .filter(|r| predicate(r.as_ref()))
                    .collect();
                (!resources.is_empty()).then_some(TargetGroup {
                    target: group.target,
                    resources,
                })
            })
            .collect();
        Self { groups }
    }

    /// Filter plan to only include resources matching a target pattern
    ///
    /// Target format: "type", "type.name" or "name"
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, name) = parse_target(t);
                self.filter(|r| matches_filter(r, resource_type.as_deref(), name.as_deref()))
            }
        }
    }

    /// Total number of resources in the plan
    pub fn total_resources(&self) -> usize {
        self.groups.iter().map(|g| g.resources.len()).sum()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Parse a target string like "type.name" into (type, name)
///
/// A single word may be either a type or a name.
fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    match target.split_once('.') {
        None => (None, Some(target.to_string())),
        Some((rt, name)) if !rt.is_empty() && !name.is_empty() => {
            (Some(rt.to_string()), Some(name.to_string()))
        }
        Some(_) => (None, Some(target.to_string())),
    }
}

/// Check if a resource matches the filter criteria
fn matches_filter(resource: &dyn Resource, resource_type: Option<&str>, name: Option<&str>) -> bool {
    match (resource_type, name) {
        (Some(rt), Some(n)) => {
            (resource.resource_type() == rt && resource.id().contains(n))
                // Names may contain dots themselves
                || resource.id() == format!("{rt}.{n}")
        }
        (None, Some(n)) => resource.resource_type() == n || resource.id().contains(n),
        (Some(rt), None) => resource.resource_type() == rt,
        (None, None) => true,
    }
}
