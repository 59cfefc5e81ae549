//! Apply context plus the hooks a front end plugs into a run

use crate::types::ApplyResult;
use anyhow::Result;

/// Receives progress while a plan is applied
pub trait ProgressCallback: Send {
    /// A target's resources are about to be reported, `count` of them
    fn on_group_start(&mut self, target: &str, count: usize);

    /// Only fired on sequential runs; concurrent groups report through
    /// `on_resource_complete` once they finish.
    fn on_resource_start(&mut self, id: &str, description: &str);

    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult);

    fn on_complete(&mut self);
}

/// Decides whether pending changes may be applied
pub trait ConfirmCallback: Send {
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Reports nothing
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_group_start(&mut self, _target: &str, _count: usize) {}
    fn on_resource_start(&mut self, _id: &str, _description: &str) {}
    fn on_resource_complete(&mut self, _id: &str, _result: &ApplyResult) {}
    fn on_complete(&mut self) {}
}

/// Approves every run, for non-interactive use
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Rejects every run
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Flags handed to each `Resource::apply`
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyContext {
    pub dry_run: bool,
    pub verbose: bool,
}

impl ApplyContext {
    pub fn new(dry_run: bool, verbose: bool) -> Self {
        Self { dry_run, verbose }
    }
}
