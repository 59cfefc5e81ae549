//! Execution engine - terminal front end for the declarative executor

use anyhow::Result;
use colored::Colorize;
use declarative::{
    ApplyResult, ConfirmCallback, ExecuteOptions as PlanOptions, ExecuteSummary, ExecutionPlan,
    ProgressCallback, compute_diffs,
};
use indicatif::ProgressBar;

use super::differ::display_diff;
use crate::progress;

/// Options for execution, including `yes` to skip the confirmation prompt
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Report pending changes without writing any file
    pub dry_run: bool,
    /// Number of files converged at once
    pub jobs: usize,
    /// Apply without asking
    pub yes: bool,
    /// Verbose output
    pub verbose: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
            yes: false,
            verbose: false,
        }
    }
}

/// Progress bar fed by the declarative executor
///
/// The bar is only drawn once the first group starts, so it never competes
/// with the confirmation prompt.
struct BarProgress {
    pb: Option<ProgressBar>,
    total: u64,
    verbose: bool,
}

impl BarProgress {
    fn new(total: usize, verbose: bool) -> Self {
        Self {
            pb: None,
            total: total as u64,
            verbose,
        }
    }

    fn bar(&mut self) -> &ProgressBar {
        let total = self.total;
        self.pb
            .get_or_insert_with(|| progress::bar(total, "Applying"))
    }
}

impl ProgressCallback for BarProgress {
    fn on_group_start(&mut self, target: &str, count: usize) {
        log::debug!("Converging {target} ({count} transforms)");
        self.bar();
    }

    fn on_resource_start(&mut self, id: &str, _description: &str) {
        self.bar().set_message(id.to_string());
    }

    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult) {
        let symbol = match result {
            ApplyResult::NoChange => "○",
            ApplyResult::Modified | ApplyResult::Removed => "✓",
            ApplyResult::Failed { .. } => "✗",
            ApplyResult::Skipped { .. } => "⊘",
        };
        let verbose = self.verbose;
        let pb = self.bar();
        pb.set_message(format!("{symbol} {id}"));
        pb.inc(1);

        if let ApplyResult::Failed { error } = result {
            pb.suspend(|| {
                println!("    {} {}: {}", "✗".red(), id, error);
            });
        } else if verbose {
            pb.suspend(|| {
                println!("    {symbol} {id}");
            });
        }
    }

    fn on_complete(&mut self) {
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
    }
}

/// Asks on the terminal unless `--yes` was given
struct PromptConfirm {
    yes: bool,
}

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if self.yes {
            return Ok(true);
        }

        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()?;

        Ok(confirmed)
    }
}

/// Show the pending changes, confirm, then converge every target file
pub fn execute(plan: ExecutionPlan, opts: ExecuteOptions) -> Result<ExecuteSummary> {
    let diffs = compute_diffs(plan.resources());
    display_diff(&diffs);

    if diffs.is_empty() {
        return Ok(ExecuteSummary::default());
    }

    let mut reporter = BarProgress::new(plan.total_resources(), opts.verbose);
    let mut confirm = PromptConfirm { yes: opts.yes };
    let plan_opts = PlanOptions {
        dry_run: opts.dry_run,
        jobs: opts.jobs,
        verbose: opts.verbose,
    };

    println!();
    let summary = declarative::execute(plan, plan_opts, &mut reporter, &mut confirm)?;

    if opts.dry_run {
        println!("  {} Dry run - no changes made", "ℹ".blue());
    } else if summary.total() == summary.skipped {
        println!("  {} Aborted", "✗".red());
    } else {
        print_summary(&summary);
    }

    Ok(summary)
}

/// Print what the run changed
fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Transforms applied successfully!", "✓".green().bold());
    } else {
        println!("  {} Transforms applied with errors", "⚠".yellow().bold());
    }

    if summary.modified > 0 {
        println!("    • {} transforms applied", summary.modified);
    }
    if summary.removed > 0 {
        println!("    • {} removals applied", summary.removed);
    }
    if summary.unchanged > 0 {
        println!("    • {} already converged", summary.unchanged);
    }
    if summary.skipped > 0 {
        println!("    • {} resources skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "resources".red());
    }
}
