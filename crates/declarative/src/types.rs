//! States, outcomes and run options shared by every resource

use serde::{Deserialize, Serialize};
use std::fmt;

/// Observed or wanted condition of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceState {
    /// The thing the resource manages is there, optionally with a note
    /// such as how many elements matched
    Present { details: Option<String> },
    Absent,
    /// Present, but holding `from` where `to` is wanted
    Modified { from: String, to: String },
    /// Could not be observed
    Unknown,
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present {
                details: Some(details),
            } => write!(f, "present ({details})"),
            Self::Present { details: None } => f.write_str("present"),
            Self::Absent => f.write_str("absent"),
            Self::Modified { from, to } => write!(f, "{from} -> {to}"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// What a single `apply` did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// Already converged, nothing written
    NoChange,
    /// Target rewritten to hold the wanted state
    Modified,
    /// Matching content removed from the target
    Removed,
    Failed { error: String },
    Skipped { reason: String },
}

/// Outcome counts of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub modified: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ExecuteSummary {
    /// Summary of a run that left `pending` changes unapplied
    pub fn all_skipped(pending: usize) -> Self {
        Self {
            skipped: pending,
            ..Self::default()
        }
    }

    /// Resources whose target was written
    pub fn changed(&self) -> usize {
        self.modified + self.removed
    }

    pub fn total(&self) -> usize {
        self.changed() + self.unchanged + self.skipped + self.failed
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn record(&mut self, result: &ApplyResult) {
        let slot = match result {
            ApplyResult::NoChange => &mut self.unchanged,
            ApplyResult::Modified => &mut self.modified,
            ApplyResult::Removed => &mut self.removed,
            ApplyResult::Failed { .. } => &mut self.failed,
            ApplyResult::Skipped { .. } => &mut self.skipped,
        };
        *slot += 1;
    }
}

/// Options for a run
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Report what would change without applying anything
    pub dry_run: bool,
    /// Upper bound on target groups applied at once
    pub jobs: usize,
    pub verbose: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
            verbose: false,
        }
    }
}
